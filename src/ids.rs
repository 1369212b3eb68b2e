use uuid::Uuid;

/// Mints an identifier for a record created while offline.
///
/// Unique within the local store's lifetime only; locally-minted ids are
/// replaced by backend-issued ids at migration time, so no cross-device
/// guarantee is needed.
pub fn local_record_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    let short_uuid: String = uuid.chars().take(12).collect();
    format!("local_{}", short_uuid)
}
