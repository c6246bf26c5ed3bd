use actix_web::error::{
    ErrorBadGateway, ErrorBadRequest, ErrorConflict, ErrorInternalServerError, ErrorNotFound,
    ErrorUnauthorized,
};
use actix_web::{Error, HttpResponse};
use serde_derive::Serialize;
use uuid::Uuid;

/// Uniform response envelope; errors carry the same shape serialized into
/// the error body.
#[derive(Serialize)]
pub(crate) struct JsonResponse<T> {
    pub(crate) status: String,
    pub(crate) message: String,
    pub(crate) code: u32,
    pub(crate) id: Option<Uuid>,
    pub(crate) item: Option<T>,
    pub(crate) list: Option<Vec<T>>,
}

pub struct JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    message: String,
    id: Option<Uuid>,
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T> JsonResponse<T>
where
    T: serde::Serialize,
{
    pub(crate) fn build() -> JsonResponseBuilder<T> {
        JsonResponseBuilder {
            message: String::new(),
            id: None,
            item: None,
            list: None,
        }
    }
}

impl<T> JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    pub(crate) fn set_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub(crate) fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub(crate) fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    pub(crate) fn set_msg(mut self, msg: impl ToString) -> Self {
        self.message = msg.to_string();
        self
    }

    fn to_response(self, status: &str, code: u32, msg: impl ToString) -> JsonResponse<T> {
        let msg = msg.to_string();
        let message = if msg.trim().is_empty() { self.message } else { msg };

        JsonResponse {
            status: status.to_string(),
            message,
            code,
            id: self.id,
            item: self.item,
            list: self.list,
        }
    }

    fn error_body(self, code: u32, msg: impl ToString) -> String {
        serde_json::to_string(&self.to_response("Error", code, msg)).unwrap_or_default()
    }

    pub(crate) fn ok(self, msg: impl ToString) -> HttpResponse {
        HttpResponse::Ok().json(self.to_response("OK", 200, msg))
    }

    pub(crate) fn bad_request(self, msg: impl ToString) -> Error {
        ErrorBadRequest(self.error_body(400, msg))
    }

    pub(crate) fn form_error(self, msg: impl ToString) -> Error {
        let msg = format!("Invalid data received: {}", msg.to_string());
        ErrorBadRequest(self.error_body(400, msg))
    }

    pub(crate) fn unauthorized(self, msg: impl ToString) -> Error {
        ErrorUnauthorized(self.error_body(401, msg))
    }

    pub(crate) fn not_found(self, msg: impl ToString) -> Error {
        ErrorNotFound(self.error_body(404, msg))
    }

    pub(crate) fn conflict(self, msg: impl ToString) -> Error {
        ErrorConflict(self.error_body(409, msg))
    }

    pub(crate) fn internal_server_error(self, msg: impl ToString) -> Error {
        let msg = msg.to_string();
        let msg = if msg.trim().is_empty() {
            "Internal Server Error".to_string()
        } else {
            msg
        };
        ErrorInternalServerError(self.error_body(500, msg))
    }

    pub(crate) fn bad_gateway(self, msg: impl ToString) -> Error {
        ErrorBadGateway(self.error_body(502, msg))
    }
}
