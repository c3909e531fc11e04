//! Integration tests per gli endpoints degli utenti
//!
//! Test per:
//! - GET /api/users/search, GET /api/users/{id}
//! - amicizie: /api/users/friends, /api/users/friend-request(s)
//! - genitori: /api/users/children, /api/users/child-conversations/{id}

mod common;

#[cfg(test)]
mod user_tests {
    use super::common::*;
    use axum_test::http::{HeaderName, StatusCode};
    use serde_json::{Value, json};
    use server::dtos::{CreateMessageDTO, MessageTarget};
    use server::entities::UserRole;
    use server::repositories::Create;
    use sqlx::SqlitePool;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    // ============================================================
    // Test per ricerca e lettura utenti
    // ============================================================

    #[sqlx::test]
    async fn test_users_require_authentication(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        app.server.get("/api/users/friends").await.assert_status_unauthorized();
        app.server
            .get("/api/users/search")
            .add_query_param("q", "a")
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test]
    async fn test_search_users_by_prefix(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        seed_user(&app.state, "Alberto", "alberto@school.test", UserRole::Student).await;
        seed_user(&app.state, "Bruno", "bruno@school.test", UserRole::Faculty).await;

        let response = app
            .server
            .get("/api/users/search")
            .add_query_param("q", "al")
            .add_header(authorization(), bearer_for(&alice))
            .await;

        response.assert_status_ok();
        let users: Vec<Value> = response.json();
        // Alice stessa è esclusa
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["fullName"], "Alberto");

        let empty = app
            .server
            .get("/api/users/search")
            .add_query_param("q", "  ")
            .add_header(authorization(), bearer_for(&alice))
            .await;
        empty.assert_status_ok();
        assert!(empty.json::<Vec<Value>>().is_empty());

        Ok(())
    }

    #[sqlx::test]
    async fn test_search_treats_wildcards_literally(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let me = seed_user(&app.state, "Me", "me@school.test", UserRole::Student).await;
        seed_user(&app.state, "Zed", "zed@school.test", UserRole::Student).await;
        seed_user(&app.state, "Bob", "bob@school.test", UserRole::Student).await;

        for q in ["%", "_", "z%d", "\\"] {
            let response = app
                .server
                .get("/api/users/search")
                .add_query_param("q", q)
                .add_header(authorization(), bearer_for(&me))
                .await;
            response.assert_status_ok();
            assert!(
                response.json::<Vec<Value>>().is_empty(),
                "query {:?} should match nothing",
                q
            );
        }

        Ok(())
    }

    #[sqlx::test]
    async fn test_get_user_by_id(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        let bruno = seed_user(&app.state, "Bruno", "bruno@school.test", UserRole::Faculty).await;

        let response = app
            .server
            .get(&format!("/api/users/{}", bruno.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["role"], "faculty");

        app.server
            .get("/api/users/9999")
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status_not_found();

        Ok(())
    }

    // ============================================================
    // Test per le richieste di amicizia
    // ============================================================

    #[sqlx::test]
    async fn test_friend_request_flow(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        let bea = seed_user(&app.state, "Bea", "bea@school.test", UserRole::Student).await;

        // Alice invia la richiesta a Bea
        let sent = app
            .server
            .post(&format!("/api/users/friend-request/{}", bea.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await;
        sent.assert_status(StatusCode::CREATED);
        let request: Value = sent.json();
        let request_id = request["requestId"].as_i64().unwrap();
        assert_eq!(request["status"], "pending");

        // Bea la vede tra le richieste in arrivo, con i dati di Alice
        let pending = app
            .server
            .get("/api/users/friend-requests")
            .add_header(authorization(), bearer_for(&bea))
            .await;
        pending.assert_status_ok();
        let pending: Value = pending.json();
        assert_eq!(pending["incoming"].as_array().unwrap().len(), 1);
        assert_eq!(pending["incoming"][0]["otherUser"]["id"], alice.user_id);
        assert!(pending["outgoing"].as_array().unwrap().is_empty());

        // Una seconda richiesta in direzione opposta è in conflitto
        app.server
            .post(&format!("/api/users/friend-request/{}", alice.user_id))
            .add_header(authorization(), bearer_for(&bea))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Solo il destinatario può accettare
        app.server
            .put(&format!("/api/users/friend-request/{}/accept", request_id))
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status_forbidden();

        let accepted = app
            .server
            .put(&format!("/api/users/friend-request/{}/accept", request_id))
            .add_header(authorization(), bearer_for(&bea))
            .await;
        accepted.assert_status_ok();
        assert_eq!(accepted.json::<Value>()["status"], "accepted");

        // Una richiesta già gestita non può essere rifiutata
        app.server
            .put(&format!("/api/users/friend-request/{}/reject", request_id))
            .add_header(authorization(), bearer_for(&bea))
            .await
            .assert_status(StatusCode::CONFLICT);

        let friends = app
            .server
            .get("/api/users/friends")
            .add_header(authorization(), bearer_for(&alice))
            .await;
        friends.assert_status_ok();
        let friends: Vec<Value> = friends.json();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["id"], bea.user_id);

        // Già amici
        app.server
            .post(&format!("/api/users/friend-request/{}", bea.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status(StatusCode::CONFLICT);

        Ok(())
    }

    #[sqlx::test]
    async fn test_friend_request_edge_cases(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        app.server
            .post(&format!("/api/users/friend-request/{}", alice.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status_bad_request();

        app.server
            .post("/api/users/friend-request/9999")
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status_not_found();

        app.server
            .put("/api/users/friend-request/9999/accept")
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status_not_found();

        Ok(())
    }

    #[sqlx::test]
    async fn test_rejected_request_allows_a_new_one(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        let bea = seed_user(&app.state, "Bea", "bea@school.test", UserRole::Student).await;

        let sent = app
            .server
            .post(&format!("/api/users/friend-request/{}", bea.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await;
        let request_id = sent.json::<Value>()["requestId"].as_i64().unwrap();

        app.server
            .put(&format!("/api/users/friend-request/{}/reject", request_id))
            .add_header(authorization(), bearer_for(&bea))
            .await
            .assert_status_ok();

        app.server
            .post(&format!("/api/users/friend-request/{}", bea.user_id))
            .add_header(authorization(), bearer_for(&alice))
            .await
            .assert_status(StatusCode::CREATED);

        Ok(())
    }

    // ============================================================
    // Test per i genitori
    // ============================================================

    #[sqlx::test]
    async fn test_link_child(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let parent = seed_user(&app.state, "Parent", "parent@home.test", UserRole::Parent).await;
        let kid = seed_user(&app.state, "Kid", "kid@school.test", UserRole::Student).await;
        let prof = seed_user(&app.state, "Prof", "prof@school.test", UserRole::Faculty).await;

        let linked = app
            .server
            .post("/api/users/children")
            .add_header(authorization(), bearer_for(&parent))
            .json(&json!({ "childEmail": "kid@school.test" }))
            .await;
        linked.assert_status(StatusCode::CREATED);
        assert_eq!(linked.json::<Value>()["id"], kid.user_id);

        app.server
            .post("/api/users/children")
            .add_header(authorization(), bearer_for(&parent))
            .json(&json!({ "childEmail": "prof@school.test" }))
            .await
            .assert_status_bad_request();

        app.server
            .post("/api/users/children")
            .add_header(authorization(), bearer_for(&parent))
            .json(&json!({ "childEmail": "nobody@school.test" }))
            .await
            .assert_status_not_found();

        // Solo i genitori
        app.server
            .get("/api/users/children")
            .add_header(authorization(), bearer_for(&prof))
            .await
            .assert_status_forbidden();

        Ok(())
    }

    #[sqlx::test]
    async fn test_child_conversations_aggregates_all_sources(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let state = &app.state;
        let parent = seed_user(state, "Parent", "parent@home.test", UserRole::Parent).await;
        let kid = seed_user(state, "Kid", "kid@school.test", UserRole::Student).await;
        let bea = seed_user(state, "Bea", "bea@school.test", UserRole::Student).await;
        let carl = seed_user(state, "Carl", "carl@school.test", UserRole::Student).await;
        let prof = seed_user(state, "Prof", "prof@school.test", UserRole::Faculty).await;
        link_parent(state, &parent, &kid).await;

        // Bea: amica e compagna di stanza; Carl: compagno di stanza; Prof: creatore e chat diretta
        make_friends(state, &kid, &bea).await;
        seed_room(state, "Math", &prof, &[&kid, &bea, &carl]).await;
        for content in ["Homework is due tomorrow", "Thanks prof"] {
            state
                .msg
                .create(&CreateMessageDTO {
                    sender_id: prof.user_id,
                    target: MessageTarget::Direct(kid.user_id),
                    content: content.to_string(),
                    attachment_id: None,
                })
                .await?;
        }

        let response = app
            .server
            .get(&format!("/api/users/child-conversations/{}", kid.user_id))
            .add_header(authorization(), bearer_for(&parent))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["child"]["id"], kid.user_id);

        let conversations = body["conversations"].as_array().unwrap();
        assert_eq!(conversations.len(), 3);
        assert!(
            conversations.iter().all(|c| c["user"]["id"] != kid.user_id),
            "lo studente non compare nella propria lista"
        );

        // Prof ha la chat diretta più recente: primo
        assert_eq!(conversations[0]["user"]["id"], prof.user_id);
        assert_eq!(conversations[0]["conversationType"], "direct");
        assert_eq!(conversations[0]["messageCount"], 2);
        assert_eq!(conversations[0]["isRoomMember"], true);

        let bea_entry = conversations
            .iter()
            .find(|c| c["user"]["id"] == bea.user_id)
            .unwrap();
        assert_eq!(bea_entry["isFriend"], true);
        assert_eq!(bea_entry["conversationType"], "room");
        assert_eq!(bea_entry["sharedRooms"][0]["name"], "Math");
        assert!(bea_entry["lastMessageAt"].is_null());

        assert_eq!(
            body["summary"],
            json!({ "total": 3, "friends": 1, "roomMembers": 3, "directChats": 1 })
        );

        Ok(())
    }

    #[sqlx::test]
    async fn test_child_conversations_authorization(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let state = &app.state;
        let parent = seed_user(state, "Parent", "parent@home.test", UserRole::Parent).await;
        let other_parent = seed_user(state, "Other", "other@home.test", UserRole::Parent).await;
        let kid = seed_user(state, "Kid", "kid@school.test", UserRole::Student).await;
        let student = seed_user(state, "Student", "student@school.test", UserRole::Student).await;
        link_parent(state, &parent, &kid).await;

        let path = format!("/api/users/child-conversations/{}", kid.user_id);

        // Genitore non collegato
        app.server
            .get(&path)
            .add_header(authorization(), bearer_for(&other_parent))
            .await
            .assert_status_forbidden();

        // Ruolo diverso da parent
        app.server
            .get(&path)
            .add_header(authorization(), bearer_for(&student))
            .await
            .assert_status_forbidden();

        // Studente inesistente
        app.server
            .get("/api/users/child-conversations/9999")
            .add_header(authorization(), bearer_for(&parent))
            .await
            .assert_status_not_found();

        // Nessuna conversazione: lista vuota
        let empty = app
            .server
            .get(&path)
            .add_header(authorization(), bearer_for(&parent))
            .await;
        empty.assert_status_ok();
        let body: Value = empty.json();
        assert!(body["conversations"].as_array().unwrap().is_empty());
        assert_eq!(body["summary"]["total"], 0);

        Ok(())
    }
}
