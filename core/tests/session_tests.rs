// tests/session_tests.rs
mod common;

use common::*;
use kirana::geo::GeoPoint;
use kirana::model::{StoreCategory, StoreUpdate};
use kirana::{AccountMode, KiranaError, MarketConfig, MarketContext, MarketRepository, OrderScope, Role, Session};
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

fn market() -> MarketContext {
  MarketContext::in_memory(MarketConfig::default(), Arc::new(ApprovingGateway::default()))
}

#[tokio::test]
#[serial]
async fn test_missing_profile_is_synthesised_and_saved() {
  setup_tracing();
  let ctx = market();
  let user = Uuid::new_v4();

  let session = ctx.open_session(user, Role::Customer, AccountMode::Live).await.unwrap();

  assert!(matches!(session, Session::Customer { .. }));
  assert_eq!(session.order_scope(), OrderScope::Customer(user));
  let saved = ctx.repository(AccountMode::Live).profile(user).await.unwrap().unwrap();
  assert_eq!(saved.role, Role::Customer);
  assert_eq!(saved.mode, AccountMode::Live);
}

#[tokio::test]
#[serial]
async fn test_store_owner_without_store_needs_support() {
  setup_tracing();
  let ctx = market();
  let owner = Uuid::new_v4();

  let err = ctx.open_session(owner, Role::StoreOwner, AccountMode::Live).await.unwrap_err();

  assert!(matches!(err, KiranaError::StoreNotLinked { owner_id } if owner_id == owner));
}

#[tokio::test]
#[serial]
async fn test_store_owner_session_scopes_to_store() {
  setup_tracing();
  let ctx = market();
  let owner = Uuid::new_v4();
  let store = seed_store(ctx.repository(AccountMode::Demo).as_ref(), owner).await;

  let session = ctx.open_session(owner, Role::StoreOwner, AccountMode::Demo).await.unwrap();

  assert_eq!(session.store().map(|s| s.id), Some(store.id));
  assert_eq!(session.order_scope(), OrderScope::Store(store.id));
  assert_eq!(session.mode(), AccountMode::Demo);
  // The live backend never saw this owner.
  assert!(ctx.repository(AccountMode::Live).profile(owner).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_stored_role_wins_over_requested_role() {
  setup_tracing();
  let ctx = market();
  let user = Uuid::new_v4();
  ctx.open_session(user, Role::Customer, AccountMode::Live).await.unwrap();

  let again = ctx.open_session(user, Role::StoreOwner, AccountMode::Live).await.unwrap();
  assert!(matches!(again, Session::Customer { .. }));
}

#[tokio::test]
#[serial]
async fn test_owner_updates_store_profile() {
  setup_tracing();
  let ctx = market();
  let owner = Uuid::new_v4();
  seed_store(ctx.repository(AccountMode::Live).as_ref(), owner).await;
  let session = ctx.open_session(owner, Role::StoreOwner, AccountMode::Live).await.unwrap();

  let updated = ctx
    .update_store(
      &session,
      StoreUpdate {
        name: Some("Sharma Fresh".into()),
        is_open: Some(false),
        category: Some(StoreCategory::FreshProduce),
        location: Some(GeoPoint::new(12.98, 77.61)),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  assert_eq!(updated.name, "Sharma Fresh");
  assert!(!updated.is_open);
  assert_eq!(updated.address, "12 MG Road");
  assert_eq!(updated.category.colour(), "#10B981");
  assert_eq!(updated.category.icon(), "carrot");

  let bad = ctx
    .update_store(
      &session,
      StoreUpdate {
        location: Some(GeoPoint::new(123.0, 0.0)),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(bad, KiranaError::InvalidInput(_)));

  let customer = ctx.open_session(Uuid::new_v4(), Role::Customer, AccountMode::Live).await.unwrap();
  let err = ctx.update_store(&customer, StoreUpdate::default()).await.unwrap_err();
  assert!(matches!(err, KiranaError::StoreNotLinked { .. }));
}

#[tokio::test]
#[serial]
async fn test_profile_edit_is_saved() {
  setup_tracing();
  let ctx = market();
  let user = Uuid::new_v4();
  let session = ctx.open_session(user, Role::Customer, AccountMode::Live).await.unwrap();

  let profile = ctx
    .update_profile(&session, Some(" Priya ".into()), Some("+91 98450 00000".into()))
    .await
    .unwrap();

  assert_eq!(profile.display_name, "Priya");
  assert_eq!(ctx.repository(AccountMode::Live).profile(user).await.unwrap().unwrap(), profile);
}
