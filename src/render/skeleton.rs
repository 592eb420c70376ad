/// 脚の関節インデックス（FrameGeometry::joints の並び）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LegJoint {
    Hip = 0,
    Knee = 1,
    Ankle = 2,
    Toe = 3,
}

/// 骨の接続定義 (開始関節, 終了関節)
pub const BONE_CONNECTIONS: [(LegJoint, LegJoint); 3] = [
    (LegJoint::Hip, LegJoint::Knee),
    (LegJoint::Knee, LegJoint::Ankle),
    (LegJoint::Ankle, LegJoint::Toe),
];
