//! Image upload and static serving of uploaded files.

use std::path::Path;

use actix_files::Files;
use actix_multipart::{Field, Multipart};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::TryStreamExt;

use inkpost_core::domain::Operation;
use inkpost_core::ports::{ImageUpload, StorageError, is_image_mime};
use inkpost_shared::dto::UploadResponse;

use crate::middleware::auth::Gate;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the file.
const IMAGE_FIELD: &str = "image";

/// Public mount point of the upload directory.
pub const UPLOADS_PATH: &str = "/uploads";

/// Read-only file service for `GET /uploads/{filename}`.
pub fn uploads_service(dir: &Path) -> Files {
    Files::new(UPLOADS_PATH, dir)
}

/// POST /api/upload
pub async fn upload_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    gate: Gate,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    gate.require(Operation::Write)?;

    let max_bytes = state.uploads.max_bytes;
    let mut image = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if image.is_some() || field.name() != Some(IMAGE_FIELD) {
            drain(&mut field).await?;
            continue;
        }
        image = Some(read_image(&mut field, max_bytes).await?);
    }

    let image = image.ok_or(StorageError::MissingFile)?;
    let stored = state.images.put(image).await?;

    let image_url = public_url(&req, state.uploads.public_base_url.as_deref(), &stored.file_name);
    tracing::info!(file_name = %stored.file_name, size = stored.size, "Image uploaded");

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        image_url,
    }))
}

/// Buffer one file part, rejecting it before anything reaches the store.
async fn read_image(field: &mut Field, max_bytes: usize) -> AppResult<ImageUpload> {
    let content_type = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();
    if !is_image_mime(&content_type) {
        return Err(StorageError::NotAnImage.into());
    }

    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(String::from);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(StorageError::TooLarge { max_bytes }.into());
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(ImageUpload::new(original_name, content_type, bytes, max_bytes)?)
}

async fn drain(field: &mut Field) -> AppResult<()> {
    while field.try_next().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", err))
}

fn public_url(req: &HttpRequest, base_url: Option<&str>, file_name: &str) -> String {
    match base_url {
        Some(base) => format!("{}{}/{}", base.trim_end_matches('/'), UPLOADS_PATH, file_name),
        None => {
            let info = req.connection_info();
            format!("{}://{}{}/{}", info.scheme(), info.host(), UPLOADS_PATH, file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use serde_json::Value;

    use inkpost_core::ports::DEFAULT_MAX_IMAGE_BYTES;

    use crate::handlers::test_support::{TestContext, multipart_file, test_app};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

    fn upload_request(content_type: String, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/upload")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
    }

    #[actix_rt::test]
    async fn test_uploaded_png_is_served_back() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let (content_type, body) = multipart_file("image", "pixel.png", "image/png", PNG);
        let resp = test::call_service(&app, upload_request(content_type, body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "File uploaded successfully");
        let url = json["imageUrl"].as_str().unwrap();
        assert!(url.starts_with("http://"));
        assert!(url.ends_with(".png"));

        let path = &url[url.find("/uploads/").unwrap()..];
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let served = test::read_body(resp).await;
        assert_eq!(served.as_ref(), PNG);
    }

    #[actix_rt::test]
    async fn test_non_image_is_rejected_without_writing() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let (content_type, body) = multipart_file("image", "notes.txt", "text/plain", b"hello");
        let resp = test::call_service(&app, upload_request(content_type, body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Not an image! Please upload only images.");
        assert_eq!(ctx.stored_file_count(), 0);
    }

    #[actix_rt::test]
    async fn test_oversized_image_is_rejected_without_writing() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let big = vec![0u8; DEFAULT_MAX_IMAGE_BYTES + 1];
        let (content_type, body) = multipart_file("image", "huge.png", "image/png", &big);
        let resp = test::call_service(&app, upload_request(content_type, body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "File is too large. Maximum size is 5MB");
        assert_eq!(ctx.stored_file_count(), 0);
    }

    #[actix_rt::test]
    async fn test_missing_image_field() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let (content_type, body) = multipart_file("avatar", "pixel.png", "image/png", PNG);
        let resp = test::call_service(&app, upload_request(content_type, body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Please upload a file");
        assert_eq!(ctx.stored_file_count(), 0);
    }

    #[actix_rt::test]
    async fn test_public_base_url_overrides_request_host() {
        let mut ctx = TestContext::open().await;
        ctx.state.uploads.public_base_url = Some("https://cdn.example.com/".to_string());
        let app = test_app!(ctx);

        let (content_type, body) = multipart_file("image", "pixel.png", "image/png", PNG);
        let json: Value =
            test::call_and_read_body_json(&app, upload_request(content_type, body).to_request()).await;

        let url = json["imageUrl"].as_str().unwrap();
        assert!(url.starts_with("https://cdn.example.com/uploads/"));
    }

    #[actix_rt::test]
    async fn test_unknown_upload_is_404() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/uploads/missing.png").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
