use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Transaction fields covered by the callback signature, in signing order.
const SIGNED_FIELDS: [&str; 20] = [
    "amount_cents",
    "created_at",
    "currency",
    "error_occured",
    "has_parent_transaction",
    "id",
    "integration_id",
    "is_3d_secure",
    "is_auth",
    "is_capture",
    "is_refunded",
    "is_standalone_payment",
    "is_voided",
    "order.id",
    "owner",
    "pending",
    "source_data.pan",
    "source_data.sub_type",
    "source_data.type",
    "success",
];

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn lookup<'a>(txn: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = txn;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        match current.get(part) {
            Some(next) => current = next,
            None => return None,
        }
        // Some callbacks send `order` as a bare id instead of an object.
        if parts.peek() == Some(&"id") && !current.is_object() {
            return Some(current);
        }
    }
    Some(current)
}

/// The string the gateway signs: every field's text, concatenated with no
/// separator. Missing and null fields contribute nothing.
pub fn signing_string(txn: &Value) -> String {
    SIGNED_FIELDS
        .iter()
        .map(|path| field_text(lookup(txn, path)))
        .collect()
}

pub fn compute_hmac(secret: &str, txn: &Value) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.trim().as_bytes()).expect("HMAC accepts any key length");
    mac.update(signing_string(txn).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison against a hex signature (case-insensitive).
pub fn verify_hmac(secret: &str, txn: &Value, received_hex: &str) -> bool {
    let Ok(received) = hex::decode(received_hex.trim().to_ascii_lowercase()) else {
        return false;
    };
    let mut mac =
        HmacSha512::new_from_slice(secret.trim().as_bytes()).expect("HMAC accepts any key length");
    mac.update(signing_string(txn).as_bytes());
    mac.verify_slice(&received).is_ok()
}
