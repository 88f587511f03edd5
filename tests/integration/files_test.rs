//! Integration tests for the file and folder hierarchy.

use http::StatusCode;
use serde_json::json;

use crate::helpers::{ALICE, BOB, TestApp};

#[tokio::test]
async fn test_create_and_list() {
    let app = TestApp::new();
    let docs = app.folder(ALICE, "docs", None).await;
    app.file(ALICE, "notes.txt", Some(&docs)).await;
    app.folder(ALICE, "archive", Some(&docs)).await;
    app.file(ALICE, "readme.md", None).await;

    let response = app.request("GET", "/api/files", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.names(), vec!["docs", "readme.md"]);

    let response = app
        .request("GET", &format!("/api/files?parentId={docs}"), None, Some(ALICE))
        .await;
    assert_eq!(response.names(), vec!["archive", "notes.txt"]);
    assert_eq!(response.data()["total_items"], 2);
    assert_eq!(response.data()["has_next"], false);

    let response = app
        .request(
            "GET",
            &format!("/api/files?parentId={docs}&page=2&pageSize=1"),
            None,
            Some(ALICE),
        )
        .await;
    assert_eq!(response.names(), vec!["notes.txt"]);
    assert_eq!(response.data()["has_previous"], true);
}

#[tokio::test]
async fn test_record_shape() {
    let app = TestApp::new();
    let docs = app.folder(ALICE, "docs", None).await;
    let id = app.file(ALICE, "notes.txt", Some(&docs)).await;

    let response = app
        .request("GET", &format!("/api/files/{id}"), None, Some(ALICE))
        .await;
    let data = response.data();

    assert_eq!(data["path"], "/docs/notes.txt");
    assert_eq!(data["size"], 2048);
    assert_eq!(data["type"], "text/plain");
    assert_eq!(data["fileUrl"], "https://cdn.test/notes.txt");
    assert_eq!(data["userId"], "alice");
    assert_eq!(data["parentId"], docs.as_str());
    assert_eq!(data["isFolder"], false);
    assert_eq!(data["isTrash"], false);

    let response = app
        .request("GET", &format!("/api/files/{docs}"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["type"], "folder");
    assert_eq!(response.data()["size"], 0);
    assert_eq!(response.data()["fileUrl"], "");
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let app = TestApp::new();

    for name in ["", "a/b"] {
        let response = app
            .request(
                "POST",
                "/api/folders",
                Some(json!({ "name": name })),
                Some(ALICE),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{name:?}");
    }
}

#[tokio::test]
async fn test_items_of_other_users_are_invisible() {
    let app = TestApp::new();
    let docs = app.folder(ALICE, "docs", None).await;

    let response = app
        .request("GET", &format!("/api/files/{docs}"), None, Some(BOB))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "mine", "parentId": docs })),
            Some(BOB),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("GET", "/api/files", None, Some(BOB)).await;
    assert!(response.names().is_empty());
}

#[tokio::test]
async fn test_rename_updates_descendant_paths() {
    let app = TestApp::new();
    let docs = app.folder(ALICE, "docs", None).await;
    let work = app.folder(ALICE, "work", Some(&docs)).await;
    let plan = app.file(ALICE, "plan.txt", Some(&work)).await;

    let response = app
        .request(
            "PATCH",
            &format!("/api/files/{docs}"),
            Some(json!({ "name": "papers" })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["path"], "/papers");

    let response = app
        .request("GET", &format!("/api/files/{plan}"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["path"], "/papers/work/plan.txt");
}

#[tokio::test]
async fn test_move_rejects_cycles() {
    let app = TestApp::new();
    let a = app.folder(ALICE, "a", None).await;
    let b = app.folder(ALICE, "b", Some(&a)).await;
    let c = app.folder(ALICE, "c", None).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{a}/move"),
            Some(json!({ "parentId": b })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{a}/move"),
            Some(json!({ "parentId": a })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{b}/move"),
            Some(json!({ "parentId": c })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["path"], "/c/b");

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{b}/move"),
            Some(json!({ "parentId": null })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.data()["path"], "/b");
    assert!(response.data()["parentId"].is_null());
}

#[tokio::test]
async fn test_star_and_share() {
    let app = TestApp::new();
    let id = app.file(ALICE, "photo.jpg", None).await;

    let response = app
        .request("POST", &format!("/api/files/{id}/star"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isStarred"], true);

    let response = app
        .request("GET", "/api/files?view=starred", None, Some(ALICE))
        .await;
    assert_eq!(response.names(), vec!["photo.jpg"]);

    let response = app
        .request("POST", &format!("/api/files/{id}/star"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isStarred"], false);

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{id}/share"),
            Some(json!({ "shared": true })),
            Some(ALICE),
        )
        .await;
    assert_eq!(response.data()["isShared"], true);
}

#[tokio::test]
async fn test_trash_restore_and_delete() {
    let app = TestApp::new();
    let docs = app.folder(ALICE, "docs", None).await;
    let notes = app.file(ALICE, "notes.txt", Some(&docs)).await;

    let response = app
        .request("DELETE", &format!("/api/files/{docs}"), None, Some(ALICE))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("POST", &format!("/api/files/{docs}/trash"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isTrash"], true);

    let response = app
        .request("GET", &format!("/api/files/{notes}"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isTrash"], true);

    let response = app.request("GET", "/api/files", None, Some(ALICE)).await;
    assert!(response.names().is_empty());
    let response = app
        .request("GET", "/api/files?view=trash", None, Some(ALICE))
        .await;
    assert_eq!(response.names(), vec!["docs"]);

    let response = app
        .request("POST", &format!("/api/files/{docs}/restore"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isTrash"], false);
    let response = app
        .request("GET", &format!("/api/files/{notes}"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["isTrash"], false);

    app.request("POST", &format!("/api/files/{docs}/trash"), None, Some(ALICE))
        .await;
    let response = app
        .request("DELETE", &format!("/api/files/{docs}"), None, Some(ALICE))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data().as_array().unwrap().len(), 2);

    let response = app
        .request("GET", &format!("/api/files/{notes}"), None, Some(ALICE))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_trash() {
    let app = TestApp::new();
    let old = app.folder(ALICE, "old", None).await;
    app.file(ALICE, "a.txt", Some(&old)).await;
    let loose = app.file(ALICE, "b.txt", None).await;
    app.file(ALICE, "keep.txt", None).await;

    for id in [&old, &loose] {
        app.request("POST", &format!("/api/files/{id}/trash"), None, Some(ALICE))
            .await;
    }

    let response = app.request("DELETE", "/api/trash", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data().as_array().unwrap().len(), 3);

    let response = app.request("GET", "/api/files", None, Some(ALICE)).await;
    assert_eq!(response.names(), vec!["keep.txt"]);
}

#[tokio::test]
async fn test_tree_and_breadcrumbs() {
    let app = TestApp::new();
    let a = app.folder(ALICE, "a", None).await;
    let b = app.folder(ALICE, "b", Some(&a)).await;
    let c = app.file(ALICE, "c.txt", Some(&b)).await;

    let response = app.request("GET", "/api/files/tree", None, Some(ALICE)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["totalNodes"], 3);

    let response = app
        .request("GET", &format!("/api/files/tree?rootId={b}"), None, Some(ALICE))
        .await;
    assert_eq!(response.data()["totalNodes"], 2);

    let response = app
        .request("GET", &format!("/api/files/{c}/breadcrumbs"), None, Some(ALICE))
        .await;
    assert_eq!(response.names(), vec!["a", "b", "c.txt"]);
    assert_eq!(response.data()[2]["path"], "/a/b/c.txt");
}
