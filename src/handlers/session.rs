use axum::Json;

use crate::middleware::Subject;
use crate::models::SubjectResponse;

// Stand-in for the downstream handlers: echoes the verified subject
pub async fn me_handler(Subject(subject_id): Subject) -> Json<SubjectResponse> {
    Json(SubjectResponse { subject_id })
}
