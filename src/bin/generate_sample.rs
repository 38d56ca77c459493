//! Write a deterministic sample scene for trying out `scene-classify`.
//!
//! Usage: `generate_sample [output.json] [floors] [seed]`

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};

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

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// (category, kind, typical area range)
const ELEMENTS: [(&str, &str, (f64, f64)); 5] = [
    ("Walls", "Mesh", (5.0, 60.0)),
    ("Floors", "Mesh", (40.0, 150.0)),
    ("Columns", "Mesh", (0.2, 2.0)),
    ("Pipes", "Line", (0.0, 0.0)),
    ("Annotations", "Points", (0.0, 0.0)),
];

const MATERIALS: [&str; 4] = ["Concrete", "Steel", "Timber", "Glass"];

fn element(rng: &mut SimpleRng, id: usize, floor: usize) -> JsonValue {
    let (category, kind, (lo, hi)) = *rng.pick(&ELEMENTS);
    let material = *rng.pick(&MATERIALS);

    // A few elements carry a non-numeric area so the undetermined marker
    // shows up in gradient views.
    let area = if hi <= 0.0 {
        JsonValue::Null
    } else if rng.next_f64() < 0.05 {
        json!("unknown")
    } else {
        json!((rng.range(lo, hi) * 100.0).round() / 100.0)
    };

    let load_bearing =
        category == "Columns" || (category == "Walls" && rng.next_f64() < 0.3);

    json!({
        "id": format!("{}-{id:04}", category.to_ascii_lowercase()),
        "kind": kind,
        "metadata": {
            "category": category,
            "level": floor.to_string(),
            "props": {
                "material": { "name": material },
                "area": area,
                "loadBearing": load_bearing,
            }
        }
    })
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output_path = args.next().unwrap_or_else(|| "sample_scene.json".to_string());
    let floors: usize = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("floors must be a number")?
        .unwrap_or(4);
    let seed: u64 = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("seed must be a number")?
        .unwrap_or(42);

    let mut rng = SimpleRng::new(seed);
    let mut nodes = Vec::new();
    for floor in 0..floors {
        let per_floor = 20 + (rng.next_u64() % 20) as usize;
        for _ in 0..per_floor {
            let id = nodes.len();
            nodes.push(element(&mut rng, id, floor));
        }
    }

    let text = serde_json::to_string_pretty(&json!({ "nodes": nodes }))?;
    std::fs::write(&output_path, text)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {} nodes over {floors} floors to {output_path}", nodes.len());
    Ok(())
}
