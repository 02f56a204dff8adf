use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Hours covered by the Seoul Metro export: 04시-05시 … 23시-24시, then 00시-01시.
const START_HOURS: [u8; 21] = [
    4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 0,
];

const MONTHS: [&str; 2] = ["202409", "202410"];

const NETWORK: &[(&str, &[(&str, f64)])] = &[
    ("1호선", &[("서울역", 1.6), ("시청", 1.1), ("종각", 1.2), ("청량리", 0.9)]),
    ("2호선", &[("강남", 2.4), ("역삼", 1.3), ("잠실", 1.9), ("시청", 0.8), ("홍대입구", 2.0)]),
    ("3호선", &[("교대", 1.0), ("고속터미널", 1.5), ("안국", 0.6)]),
];

/// Minimal deterministic PRNG (splitmix64)
struct SimpleRng(u64);

impl SimpleRng {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Commuter-shaped daily curve: morning and evening peaks.
fn hourly_weight(hour: u8) -> f64 {
    let h = f64::from(hour);
    let peak = |mu: f64, sigma: f64| (-(h - mu).powi(2) / (2.0 * sigma * sigma)).exp();
    0.08 + peak(8.0, 1.0) + 0.8 * peak(18.5, 1.3) + 0.25 * peak(13.0, 3.0)
}

fn slot_label(start: u8) -> String {
    format!("{:02}시-{:02}시", start, start + 1)
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng(42);

    let mut headers: Vec<String> = vec!["사용월".into(), "호선명".into(), "지하철역".into()];
    for &h in &START_HOURS {
        headers.push(format!("{} 승차인원", slot_label(h)));
        headers.push(format!("{} 하차인원", slot_label(h)));
    }
    headers.push("작업일자".into());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (m, month) in MONTHS.iter().enumerate() {
        for (line, stations) in NETWORK {
            for (station, scale) in stations.iter() {
                let mut row = vec![month.to_string(), line.to_string(), station.to_string()];
                for &h in &START_HOURS {
                    let base = 30_000.0 * scale * hourly_weight(h);
                    // mornings: more boarding at residential ends, evenings reversed
                    let (ride_bias, alight_bias) = if h < 12 { (1.1, 0.9) } else { (0.9, 1.1) };
                    let ride = base * ride_bias * (0.85 + 0.3 * rng.next_f64());
                    let alight = base * alight_bias * (0.85 + 0.3 * rng.next_f64());
                    row.push(format!("{}", ride.round() as u64));
                    row.push(format!("{}", alight.round() as u64));
                }
                row.push(format!("2024110{}", m + 1));
                rows.push(row);
            }
        }
    }

    // ---- CSV in CP949, like the Seoul open-data export ----
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    let text = String::from_utf8(writer.into_inner()?)?;
    let (bytes, _, had_errors) = encoding_rs::EUC_KR.encode(&text);
    anyhow::ensure!(!had_errors, "sample text is not representable in CP949");
    let csv_path = "sample_ridership.csv";
    std::fs::write(csv_path, &bytes)?;

    // ---- Same table as Parquet: text keys, integer counts ----
    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let numeric = i >= 3 && i < headers.len() - 1;
            Field::new(h, if numeric { DataType::Int64 } else { DataType::Utf8 }, false)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let columns: Vec<ArrayRef> = (0..headers.len())
        .map(|i| -> anyhow::Result<ArrayRef> {
            if schema.field(i).data_type() == &DataType::Int64 {
                let values = rows
                    .iter()
                    .map(|r| r[i].parse::<i64>())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(Int64Array::from(values)))
            } else {
                Ok(Arc::new(StringArray::from(
                    rows.iter().map(|r| r[i].as_str()).collect::<Vec<_>>(),
                )))
            }
        })
        .collect::<anyhow::Result<_>>()?;
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let parquet_path = "sample_ridership.parquet";
    let file = std::fs::File::create(parquet_path)?;
    let mut pq = ArrowWriter::try_new(file, schema, None)?;
    pq.write(&batch)?;
    pq.close()?;

    println!(
        "Wrote {} records ({} time slots) to {csv_path} and {parquet_path}",
        rows.len(),
        START_HOURS.len()
    );
    Ok(())
}
