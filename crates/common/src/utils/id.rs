use uuid::Uuid;

/// Correlation id for one tunneled request; appears only in logs
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}
