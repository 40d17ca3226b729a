use super::*;
use crate::api::api_router;
use crate::api::test_support::{send, test_state};
use raidesk_storage::StorageAdapter;
use serde_json::{json, Value};

fn plan_json(id: &str, title: &str, duration: &str) -> Value {
    json!({
        "id": id,
        "tier": "fastest",
        "title": title,
        "description": "Class II via substantial equivalence",
        "totalDuration": duration,
        "riskLevel": "medium",
        "commonStandards": {
            "timeline": [{
                "phase": "QMS setup",
                "description": "ISO 13485",
                "duration": "12 weeks",
                "deliverables": ["Quality manual"]
            }],
            "standards": ["ISO 13485"],
            "documentation": []
        },
        "performanceEvaluation": {
            "timeline": [],
            "tests": ["IEC 60601-1"],
            "documentation": []
        },
        "pros": [],
        "cons": [],
        "recommendations": []
    })
}

#[tokio::test]
async fn test_save_and_fetch_versions() {
    let state = test_state().await;

    let (status, body) = send(
        api_router(state.clone()),
        "POST",
        "/api/plans",
        Some(json!({"plan": plan_json("p1", "Fast track", "9 months"), "session_id": "s1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["current_version"], 1);
    assert_eq!(body["data"]["session_id"], "s1");

    let (status, body) = send(
        api_router(state.clone()),
        "POST",
        "/api/plans",
        Some(json!({
            "plan": plan_json("p1", "Fast track", "6 months"),
            "modifications": "shorten timeline"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["current_version"], 2);
    assert_eq!(body["data"]["versions"][1]["modifications"], "shorten timeline");
    assert!(body["data"]["versions"][0].get("plan_data").is_none());

    let (_, body) = send(api_router(state.clone()), "GET", "/api/plans/p1", None).await;
    assert_eq!(body["data"]["totalDuration"], "6 months");

    let (_, body) = send(
        api_router(state.clone()),
        "GET",
        "/api/plans/p1?version=1",
        None,
    )
    .await;
    assert_eq!(body["data"]["totalDuration"], "9 months");

    let (status, body) = send(api_router(state), "GET", "/api/plans/p1?version=5", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Plan not found: p1 (version 5)");
}

#[tokio::test]
async fn test_expected_version_conflict() {
    let state = test_state().await;

    let (status, _) = send(
        api_router(state.clone()),
        "POST",
        "/api/plans",
        Some(json!({"plan": plan_json("p1", "A", "1 month"), "expected_version": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        api_router(state.clone()),
        "POST",
        "/api/plans",
        Some(json!({"plan": plan_json("p1", "B", "1 month"), "expected_version": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let record = state.plans.get_record("p1").await.unwrap();
    assert_eq!(record.current_version, 1);
}

#[tokio::test]
async fn test_empty_plan_id_is_unprocessable() {
    let state = test_state().await;

    let (status, _) = send(
        api_router(state),
        "POST",
        "/api/plans",
        Some(json!({"plan": plan_json("", "A", "1 month")})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_and_delete_plans() {
    let state = test_state().await;
    for (id, session) in [("a", "s1"), ("b", "s2")] {
        let plan: Plan = serde_json::from_value(plan_json(id, id, "3 months")).unwrap();
        state.plans.save(&plan, Some(session), None).await.unwrap();
    }

    let response = tokio_test::assert_ok!(
        list_plans(State(state.clone()), ApiQuery(ListPlansQuery::default())).await
    );
    assert_eq!(response.0.data.unwrap().count, 2);

    let (status, body) = send(
        api_router(state.clone()),
        "GET",
        "/api/plans?session_id=s1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["plans"][0]["id"], "a");
    assert_eq!(body["data"]["plans"][0]["tier"], "fastest");

    let (status, _) = send(api_router(state.clone()), "DELETE", "/api/plans/a", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(api_router(state.clone()), "GET", "/api/plans/a/record", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(api_router(state), "DELETE", "/api/plans/a", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_skips_unreadable_current_plan() {
    let state = test_state().await;
    let plan: Plan = serde_json::from_value(plan_json("good", "Good", "3 months")).unwrap();
    state.plans.save(&plan, None, None).await.unwrap();
    state
        .storage
        .set(
            "plan:odd",
            &json!({
                "id": "odd",
                "current_version": 1,
                "versions": [{
                    "version": 1,
                    "plan_data": {"id": "odd"},
                    "created_at": "2025-01-01T00:00:00Z"
                }],
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            }),
            None,
        )
        .await
        .unwrap();

    let (_, body) = send(api_router(state), "GET", "/api/plans", None).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["plans"][0]["id"], "good");
}

#[tokio::test]
async fn test_invalid_plan_field_uses_error_envelope() {
    let state = test_state().await;
    let mut plan = plan_json("p1", "A", "1 month");
    plan["riskLevel"] = json!("extreme");

    let (status, body) = send(
        api_router(state.clone()),
        "POST",
        "/api/plans",
        Some(json!({"plan": plan})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("extreme"));

    let (status, body) = send(
        api_router(state.clone()),
        "GET",
        "/api/plans/p1?version=latest",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let plans = tokio_test::assert_ok!(state.plans.list(None).await);
    assert!(plans.is_empty());
}
