use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// One projected vector as served by `/api/vectors`.
#[derive(Debug, Serialize)]
struct SampleVector {
    id: String,
    header: Option<String>,
    category: String,
    source: String,
    page: i64,
    score: f64,
    /// Unique per row, so the viewer treats it as unfilterable.
    doc_id: String,
    x: f64,
    y: f64,
    z: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn string_column(vectors: &[SampleVector], f: impl Fn(&SampleVector) -> &str) -> StringArray {
    StringArray::from(vectors.iter().map(f).collect::<Vec<_>>())
}

fn float_column(vectors: &[SampleVector], f: impl Fn(&SampleVector) -> f64) -> Float64Array {
    Float64Array::from(vectors.iter().map(f).collect::<Vec<_>>())
}

/// Keep coordinates in the unit cube like the backend's min-max scaled embedding.
fn unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let clusters: [(&str, [f64; 3]); 4] = [
        ("finance", [0.2, 0.3, 0.7]),
        ("health", [0.7, 0.2, 0.3]),
        ("sports", [0.5, 0.8, 0.5]),
        ("science", [0.8, 0.7, 0.8]),
    ];
    let sources = ["wiki", "news", "arxiv", "forum"];
    let per_cluster = 60;

    let mut vectors = Vec::with_capacity(clusters.len() * per_cluster);
    for (category, centre) in &clusters {
        for i in 0..per_cluster {
            let n = vectors.len();
            let header = if i % 5 == 0 {
                None
            } else {
                Some(format!("{} chunk {i}", category.to_uppercase()))
            };
            vectors.push(SampleVector {
                id: format!("vec-{n:04}"),
                header,
                category: category.to_string(),
                source: rng.pick(&sources).to_string(),
                page: (i % 12) as i64 + 1,
                score: (rng.next_f64() * 100.0).round() / 100.0,
                doc_id: format!("doc-{n:05}"),
                x: unit(rng.gauss(centre[0], 0.08)),
                y: unit(rng.gauss(centre[1], 0.08)),
                z: unit(rng.gauss(centre[2], 0.08)),
            });
        }
    }

    // JSON – same shape as the endpoint
    let json_path = "sample_vectors.json";
    let file = std::fs::File::create(json_path).expect("Failed to create JSON file");
    serde_json::to_writer_pretty(file, &vectors).expect("Failed to write JSON");

    // CSV – same layout as the backend's cached embedding
    let csv_path = "sample_vectors.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    for v in &vectors {
        writer.serialize(v).expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("header", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("page", DataType::Int64, false),
        Field::new("score", DataType::Float64, false),
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
        Field::new("z", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(string_column(&vectors, |v| v.id.as_str())),
            Arc::new(StringArray::from(
                vectors.iter().map(|v| v.header.as_deref()).collect::<Vec<_>>(),
            )),
            Arc::new(string_column(&vectors, |v| v.category.as_str())),
            Arc::new(string_column(&vectors, |v| v.source.as_str())),
            Arc::new(Int64Array::from(vectors.iter().map(|v| v.page).collect::<Vec<_>>())),
            Arc::new(float_column(&vectors, |v| v.score)),
            Arc::new(string_column(&vectors, |v| v.doc_id.as_str())),
            Arc::new(float_column(&vectors, |v| v.x)),
            Arc::new(float_column(&vectors, |v| v.y)),
            Arc::new(float_column(&vectors, |v| v.z)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = "sample_vectors.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} vectors to {json_path}, {csv_path} and {parquet_path}",
        vectors.len()
    );
}
