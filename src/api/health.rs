use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/test/").route(web::get().to(test_api)));
}

async fn test_api() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "API is working" }))
}
