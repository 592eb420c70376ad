use nalgebra::{Point2, Vector2};
use serde::Serialize;

use crate::calibration::AngleSample;
use crate::render::SegmentRole;

/// 各セグメントの絶対角に加えるオフセット（度）
///
/// アセット画像の向きに合わせた値。合成側の画像規約と一致している必要がある。
pub const HIP_ANGLE_OFFSET: f64 = -90.0;
pub const KNEE_ANGLE_OFFSET: f64 = 90.0;
pub const FOOT_ANGLE_OFFSET: f64 = 270.0;

/// セグメント長（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentLengths {
    /// 腰→膝
    pub l1: f64,
    /// 膝→足首
    pub l2: f64,
    /// 足首→つま先
    pub l3: f64,
}

impl SegmentLengths {
    pub fn new(l1: f64, l2: f64, l3: f64) -> Self {
        Self { l1, l2, l3 }
    }

    pub fn get(&self, role: SegmentRole) -> f64 {
        match role {
            SegmentRole::Hip => self.l1,
            SegmentRole::Knee => self.l2,
            SegmentRole::Foot => self.l3,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.l1 * factor, self.l2 * factor, self.l3 * factor)
    }
}

impl Default for SegmentLengths {
    fn default() -> Self {
        Self::new(250.0, 300.0, 90.0)
    }
}

/// 1フレーム分の解の出力
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameGeometry {
    pub hip_pos: Point2<f64>,
    pub knee_pos: Point2<f64>,
    pub ankle_pos: Point2<f64>,
    pub toe_pos: Point2<f64>,
    /// 腰→膝セグメントの絶対角（度、正規化しない）
    pub hip_angle: f64,
    pub knee_angle: f64,
    pub foot_angle: f64,
}

impl FrameGeometry {
    /// 腰・膝・足首・つま先
    pub fn joints(&self) -> [Point2<f64>; 4] {
        [self.hip_pos, self.knee_pos, self.ankle_pos, self.toe_pos]
    }

    /// セグメントの (始点, 終点)
    pub fn endpoints(&self, role: SegmentRole) -> (Point2<f64>, Point2<f64>) {
        match role {
            SegmentRole::Hip => (self.hip_pos, self.knee_pos),
            SegmentRole::Knee => (self.knee_pos, self.ankle_pos),
            SegmentRole::Foot => (self.ankle_pos, self.toe_pos),
        }
    }

    pub fn angle(&self, role: SegmentRole) -> f64 {
        match role {
            SegmentRole::Hip => self.hip_angle,
            SegmentRole::Knee => self.knee_angle,
            SegmentRole::Foot => self.foot_angle,
        }
    }

    /// (セグメント, 始点, 終点, 絶対角) を腰・膝・足の順に
    pub fn segments(&self) -> [(SegmentRole, Point2<f64>, Point2<f64>, f64); SegmentRole::COUNT] {
        SegmentRole::ALL.map(|role| {
            let (start, end) = self.endpoints(role);
            (role, start, end, self.angle(role))
        })
    }

    /// セグメント中点（スプライトの配置位置）
    pub fn segment_center(&self, role: SegmentRole) -> Point2<f64> {
        let (start, end) = self.endpoints(role);
        nalgebra::center(&start, &end)
    }
}

/// 角度 deg 方向の単位ベクトル（画面座標、Y軸下向き）
fn screen_direction(deg: f64) -> Vector2<f64> {
    let rad = deg.to_radians();
    Vector2::new(rad.cos(), -rad.sin())
}

/// 3リンク平面チェーンの順運動学
///
/// theta_h, theta_k, theta_f は校正済み関節角（度）。
/// 各セグメントの絶対角は近位側の関節角の和 + 固定オフセット。
pub fn solve(
    hip: Point2<f64>,
    lengths: SegmentLengths,
    theta_h: f64,
    theta_k: f64,
    theta_f: f64,
) -> FrameGeometry {
    let hip_angle = -theta_h + HIP_ANGLE_OFFSET;
    let knee_pos = hip + lengths.l1 * screen_direction(hip_angle);

    let knee_angle = KNEE_ANGLE_OFFSET - theta_h - theta_k;
    let ankle_pos = knee_pos + lengths.l2 * screen_direction(knee_angle);

    let foot_angle = FOOT_ANGLE_OFFSET - theta_h - theta_k + theta_f;
    let toe_pos = ankle_pos + lengths.l3 * screen_direction(foot_angle);

    FrameGeometry {
        hip_pos: hip,
        knee_pos,
        ankle_pos,
        toe_pos,
        hip_angle,
        knee_angle,
        foot_angle,
    }
}

/// 1フレームのリグ。固定された腰位置とセグメント長に、そのフレームの関節角を組み合わせる。
#[derive(Debug, Clone, Copy)]
pub struct SegmentChain {
    pub hip: Point2<f64>,
    pub lengths: SegmentLengths,
    pub angles: AngleSample,
}

impl SegmentChain {
    pub fn new(hip: Point2<f64>, lengths: SegmentLengths, angles: AngleSample) -> Self {
        Self { hip, lengths, angles }
    }

    pub fn solve(&self) -> FrameGeometry {
        solve(
            self.hip,
            self.lengths,
            self.angles.hip,
            self.angles.knee,
            self.angles.foot,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-9;

    fn unit() -> SegmentLengths {
        SegmentLengths::new(1.0, 1.0, 1.0)
    }

    #[test]
    fn test_zero_angles_unit_lengths() {
        let g = solve(Point2::origin(), unit(), 0.0, 0.0, 0.0);
        assert_eq!(g.hip_angle, -90.0);
        assert_eq!(g.knee_angle, 90.0);
        assert_eq!(g.foot_angle, 270.0);
        assert_abs_diff_eq!(g.knee_pos, Point2::new(0.0, 1.0), epsilon = EPS);
        assert_abs_diff_eq!(g.ankle_pos, Point2::new(0.0, 0.0), epsilon = EPS);
        assert_abs_diff_eq!(g.toe_pos, Point2::new(0.0, 1.0), epsilon = EPS);
    }

    #[test]
    fn test_deterministic() {
        let hip = Point2::new(350.0, 100.0);
        let a = solve(hip, SegmentLengths::default(), 12.3, 140.5, 97.25);
        let b = solve(hip, SegmentLengths::default(), 12.3, 140.5, 97.25);
        assert_eq!(a, b);
        assert_eq!(a.knee_pos.x.to_bits(), b.knee_pos.x.to_bits());
        assert_eq!(a.toe_pos.y.to_bits(), b.toe_pos.y.to_bits());
    }

    #[test]
    fn test_doubling_lengths_doubles_offsets() {
        let hip = Point2::new(350.0, 100.0);
        let base = SegmentLengths::default();
        let g1 = solve(hip, base, 20.0, 120.0, 90.0);
        let g2 = solve(hip, base.scaled(2.0), 20.0, 120.0, 90.0);

        assert_eq!(g1.hip_angle, g2.hip_angle);
        assert_eq!(g1.knee_angle, g2.knee_angle);
        assert_eq!(g1.foot_angle, g2.foot_angle);
        for (p1, p2) in g1.joints().iter().zip(g2.joints().iter()) {
            assert_abs_diff_eq!((p2 - hip), (p1 - hip) * 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_foot_angle_only_moves_toe() {
        let hip = Point2::new(350.0, 100.0);
        let lengths = SegmentLengths::default();
        let a = solve(hip, lengths, 10.0, 130.0, 85.0);
        let b = solve(hip, lengths, 10.0, 130.0, 125.0);

        assert_eq!(a.knee_pos, b.knee_pos);
        assert_eq!(a.ankle_pos, b.ankle_pos);
        assert_eq!(a.hip_angle, b.hip_angle);
        assert_eq!(a.knee_angle, b.knee_angle);
        assert_eq!(b.foot_angle - a.foot_angle, 40.0);
        assert_ne!(a.toe_pos, b.toe_pos);
    }

    #[test]
    fn test_knee_angle_depends_on_hip_and_knee() {
        let hip = Point2::origin();
        let g = solve(hip, unit(), 30.0, 100.0, 0.0);
        assert_eq!(g.knee_angle, 90.0 - 30.0 - 100.0);
        assert_eq!(g.hip_angle, -120.0);
        assert_eq!(g.foot_angle, 270.0 - 130.0);
    }

    #[test]
    fn test_segment_lengths_preserved() {
        let hip = Point2::new(350.0, 100.0);
        let g = solve(hip, SegmentLengths::default(), -15.0, 100.0, 85.0);
        assert_abs_diff_eq!((g.knee_pos - g.hip_pos).norm(), 250.0, epsilon = 1e-9);
        assert_abs_diff_eq!((g.ankle_pos - g.knee_pos).norm(), 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!((g.toe_pos - g.ankle_pos).norm(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_lengths_collapse() {
        let hip = Point2::new(5.0, 7.0);
        let g = solve(hip, SegmentLengths::new(0.0, 0.0, 0.0), 33.0, 44.0, 55.0);
        assert_eq!(g.knee_pos, hip);
        assert_eq!(g.toe_pos, hip);
    }

    #[test]
    fn test_angles_not_normalized() {
        let g = solve(Point2::origin(), unit(), 400.0, 10.0, -720.0);
        assert_eq!(g.hip_angle, -490.0);
        assert_eq!(g.foot_angle, 270.0 - 410.0 - 720.0);
    }

    #[test]
    fn test_segment_center() {
        let g = solve(Point2::new(0.0, 0.0), SegmentLengths::new(2.0, 1.0, 1.0), 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(g.segment_center(SegmentRole::Hip), Point2::new(0.0, 1.0), epsilon = EPS);
    }

    #[test]
    fn test_segments_are_chained() {
        let g = solve(Point2::new(350.0, 100.0), SegmentLengths::default(), 10.0, 120.0, 90.0);
        let segs = g.segments();
        assert_eq!(segs[0], (SegmentRole::Hip, g.hip_pos, g.knee_pos, g.hip_angle));
        assert_eq!(segs[1], (SegmentRole::Knee, g.knee_pos, g.ankle_pos, g.knee_angle));
        assert_eq!(segs[2], (SegmentRole::Foot, g.ankle_pos, g.toe_pos, g.foot_angle));
    }

    #[test]
    fn test_chain_matches_solve() {
        let hip = Point2::new(350.0, 100.0);
        let angles = AngleSample::new(-15.0, 100.0, 85.0);
        let chain = SegmentChain::new(hip, SegmentLengths::default(), angles);
        assert_eq!(chain.solve(), solve(hip, SegmentLengths::default(), -15.0, 100.0, 85.0));
    }
}
