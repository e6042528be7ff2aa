#![allow(dead_code)]

use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

pub const CONFIG: &str = "tests/fixtures/acquirers.json";
pub const TRANSACTIONS: &str = "tests/fixtures/transactions.csv";
pub const NOTIFICATIONS: &str = "tests/fixtures/notifications.jsonl";

/// HMAC-MD5 of `api_login^11445529^1446529775^320.00^` keyed with `trans_key`.
pub const FINGERPRINT: &str = "f8a456a44e9ac67b226df3d019b30ab3";

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// One JSON line carrying an Authorize.Net relay response for 320.00.
pub fn authorize_line(reference: &str, trans_id: &str, code: &str, hash: &str) -> String {
    json!({
        "gateway": "authorize",
        "fields": {
            "x_invoice_num": reference,
            "x_trans_id": trans_id,
            "x_response_code": code,
            "x_amount": "320.00",
            "x_fp_sequence": "11445529",
            "x_fp_timestamp": "1446529775",
            "x_fp_hash": hash,
        }
    })
    .to_string()
}
