//! CSV signal table: one row per frame, raw `Hip`/`Knee`/`Foot` columns.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::calibration::{AngleSample, Joint};
use crate::error::{GaitError, Result};

/// 1行分の生信号
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRow {
    pub hip: f64,
    pub knee: f64,
    pub foot: f64,
}

impl SignalRow {
    pub fn new(hip: f64, knee: f64, foot: f64) -> Self {
        Self { hip, knee, foot }
    }

    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::Hip => self.hip,
            Joint::Knee => self.knee,
            Joint::Foot => self.foot,
        }
    }
}

/// CSVファイルを読み込む
pub fn load_signals<P: AsRef<Path>>(path: P) -> Result<Vec<SignalRow>> {
    let file = File::open(path.as_ref()).map_err(csv::Error::from)?;
    read_signals(file)
}

/// ヘッダ付きCSVから信号行を読む
///
/// 必須列が無い場合、または値が数値でない場合はエラー。他の列は無視する。
pub fn read_signals<R: Read>(reader: R) -> Result<Vec<SignalRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut columns = [0usize; Joint::COUNT];
    for joint in Joint::ALL {
        columns[joint as usize] = headers
            .iter()
            .position(|h| h == joint.column())
            .ok_or(GaitError::MissingColumn(joint.column()))?;
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row_no = i + 1;
        let mut values = [0.0f64; Joint::COUNT];
        for joint in Joint::ALL {
            let cell = record
                .get(columns[joint as usize])
                .ok_or_else(|| GaitError::InvalidCell {
                    row: row_no,
                    column: joint.column(),
                    reason: "missing field".to_string(),
                })?;
            let value: f64 = cell.parse().map_err(|e: std::num::ParseFloatError| {
                GaitError::InvalidCell {
                    row: row_no,
                    column: joint.column(),
                    reason: format!("{:?}: {}", cell, e),
                }
            })?;
            // NaN / inf は parse を通るので別に弾く
            if !value.is_finite() {
                return Err(GaitError::InvalidCell {
                    row: row_no,
                    column: joint.column(),
                    reason: format!("{:?}: non-finite value", cell),
                });
            }
            values[joint as usize] = value;
        }
        rows.push(SignalRow::new(
            values[Joint::Hip as usize],
            values[Joint::Knee as usize],
            values[Joint::Foot as usize],
        ));
    }

    Ok(rows)
}

/// 生信号と角度列を並べたテーブルを書き出す
pub fn write_angle_table<W: Write>(
    writer: W,
    rows: &[SignalRow],
    samples: &[AngleSample],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = Joint::ALL
        .iter()
        .map(|j| j.column())
        .chain(Joint::ALL.iter().map(|j| j.angle_column()))
        .collect();
    wtr.write_record(&header)?;

    for (row, sample) in rows.iter().zip(samples) {
        let record: Vec<String> = Joint::ALL
            .iter()
            .map(|&j| row.get(j).to_string())
            .chain(Joint::ALL.iter().map(|&j| sample.get(j).to_string()))
            .collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
