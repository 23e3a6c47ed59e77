//! Post handlers, shared by the public and admin surfaces.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use inkpost_core::domain::{Operation, Post, PostInput};
use inkpost_core::error::RepoError;
use inkpost_shared::MessageResponse;
use inkpost_shared::dto::PostRequest;

use crate::middleware::auth::Gate;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const POST_NOT_FOUND: &str = "Post not found";

fn post_input(req: PostRequest) -> PostInput {
    PostInput {
        title: req.title,
        content: req.content,
        image: req.image,
    }
}

/// Malformed ids are store-level failures, not misses.
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::Internal(format!("Cast to post id failed for value \"{raw}\": {e}")))
}

/// GET /api/posts, GET /api/admin/posts
pub async fn list_posts(state: web::Data<AppState>, gate: Gate) -> AppResult<HttpResponse> {
    gate.require(Operation::Read)?;

    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    gate: Gate,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    gate.require(Operation::Read)?;
    let id = parse_post_id(&path)?;

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts, POST /api/admin/posts
pub async fn create_post(
    state: web::Data<AppState>,
    gate: Gate,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    gate.require(Operation::Write)?;

    let draft = post_input(body.into_inner()).into_draft()?;
    let post = state.posts.insert(Post::new(draft)).await?;

    tracing::info!(post_id = %post.id, surface = ?gate.surface(), "Post created");
    Ok(HttpResponse::Created().json(post))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    gate: Gate,
    path: web::Path<String>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    gate.require(Operation::Write)?;
    let id = parse_post_id(&path)?;

    let changes = post_input(body.into_inner()).into_changes()?;
    let post = state
        .posts
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}, DELETE /api/admin/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    gate: Gate,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    gate.require(Operation::Write)?;
    let id = parse_post_id(&path)?;

    match state.posts.delete(id).await {
        Ok(()) => {}
        Err(RepoError::NotFound) => return Err(AppError::NotFound(POST_NOT_FOUND.to_string())),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(post_id = %id, surface = ?gate.surface(), "Post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::handlers::test_support::{TestContext, test_app};

    #[actix_rt::test]
    async fn test_create_get_delete_scenario() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Hi", "content": "World"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["title"], "Hi");
        assert_eq!(created["content"], "World");
        assert_eq!(created["image"], "");
        let id = created["_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&format!("/api/posts/{id}")).to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, created);

        let req = test::TestRequest::delete().uri(&format!("/api/posts/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Post deleted successfully"}));

        let req = test::TestRequest::get().uri(&format!("/api/posts/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Post not found");
    }

    #[actix_rt::test]
    async fn test_list_returns_created_minus_deleted() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let mut ids = Vec::new();
        for n in 0..5 {
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .set_json(json!({"title": format!("Post {n}"), "content": "body"}))
                .to_request();
            let created: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(created["_id"].as_str().unwrap().to_string());
        }
        for id in &ids[..2] {
            let req = test::TestRequest::delete().uri(&format!("/api/posts/{id}")).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let titles: Vec<_> = posts.iter().map(|p| p["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Post 2", "Post 3", "Post 4"]);
    }

    #[actix_rt::test]
    async fn test_list_is_empty_initially() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(posts.is_empty());
    }

    #[actix_rt::test]
    async fn test_update_replaces_only_given_fields() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Old", "content": "Body", "image": "http://a/x.png"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["_id"].as_str().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{id}"))
            .set_json(json!({"title": "New", "image": "http://a/y.png"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = test::read_body_json(resp).await;

        assert_eq!(updated["_id"], created["_id"]);
        assert_eq!(updated["title"], "New");
        assert_eq!(updated["content"], "Body");
        assert_eq!(updated["image"], "http://a/y.png");
        assert_eq!(updated["createdAt"], created["createdAt"]);
    }

    #[actix_rt::test]
    async fn test_update_missing_post_is_404() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
            .set_json(json!({"title": "New", "content": "Body"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_delete_missing_post_is_404() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_create_requires_title_and_content() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            "title must not be empty, content is required"
        );

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(posts.is_empty());
    }

    #[actix_rt::test]
    async fn test_malformed_json_is_a_problem_response() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
    }

    #[actix_rt::test]
    async fn test_malformed_id_is_a_server_error() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/posts/not-an-id").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("not-an-id"));
    }

    #[actix_rt::test]
    async fn test_admin_surface_shares_the_store() {
        let ctx = TestContext::open().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/admin/posts")
            .set_json(json!({"title": "From admin", "content": "Body"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["_id"].as_str().unwrap();

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let public: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(public.len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/posts/{id}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/admin/posts").to_request();
        let admin: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(admin.is_empty());
    }

    #[actix_rt::test]
    async fn test_protected_admin_surface_requires_admin_token() {
        let ctx = TestContext::protected(false).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/admin/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/admin/posts")
            .insert_header((header::AUTHORIZATION, "Bearer garbage"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/admin/posts")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", ctx.reader_token())))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/admin/posts")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", ctx.admin_token())))
            .set_json(json!({"title": "Hi", "content": "World"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        // Public surface stays open unless public writes are protected too.
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Open", "content": "Body"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[actix_rt::test]
    async fn test_protected_public_writes() {
        let ctx = TestContext::protected(true).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Hi", "content": "World"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
