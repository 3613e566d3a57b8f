//! Data generators for benchmarks

use fake::faker::address::en::CityName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use serde_json::{json, Value};

/// Generate a flat user record
pub fn generate_user(id: usize) -> Value {
    let mut rng = rand::thread_rng();
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let email: String = FreeEmail().fake();

    json!({
        "id": id,
        "firstName": first_name,
        "lastName": last_name,
        "email": email,
        "age": rng.gen_range(18..80),
        "active": rng.gen_bool(0.8),
    })
}

/// Generate a nested document with `items` array entries
pub fn generate_document(items: usize) -> Value {
    let mut rng = rand::thread_rng();
    let entries: Vec<Value> = (0..items)
        .map(|i| {
            let city: String = CityName().fake();
            json!({
                "index": i,
                "city": city,
                "x": rng.gen_range(0.0..1000.0),
                "y": rng.gen_range(0.0..1000.0),
            })
        })
        .collect();

    json!({
        "owner": generate_user(0),
        "tags": ["bench", "generated"],
        "items": entries,
    })
}
