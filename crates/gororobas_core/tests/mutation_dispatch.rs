use gororobas_core::{
    dispatch_delete, dispatch_update, AuthorizationError, BoundSession, ChangeSet, DispatchState,
    EntityId, EntityKind, FieldValue, MutationOutcome, SessionCapability, StoreClient, StoreError,
};
use uuid::Uuid;

/// Store double that records every call and can be told to fail.
#[derive(Default)]
struct CountingStore {
    updates: Vec<(EntityId, ChangeSet)>,
    deletes: Vec<(EntityKind, Vec<EntityId>)>,
    fail_with: Option<&'static str>,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.updates.len() + self.deletes.len()
    }
}

impl StoreClient for CountingStore {
    fn update_fields(&mut self, id: EntityId, changes: &ChangeSet) -> Result<(), StoreError> {
        self.updates.push((id, changes.clone()));
        match self.fail_with {
            Some(reason) => Err(StoreError::new(reason)),
            None => Ok(()),
        }
    }

    fn delete_entities(&mut self, kind: EntityKind, ids: &[EntityId]) -> Result<usize, StoreError> {
        self.deletes.push((kind, ids.to_vec()));
        match self.fail_with {
            Some(reason) => Err(StoreError::new(reason)),
            None => Ok(ids.len()),
        }
    }
}

/// Session double with a fixed authorization answer.
struct FixedSession {
    verdict: Result<(), AuthorizationError>,
    authorize_calls: std::cell::Cell<usize>,
    store: CountingStore,
}

impl FixedSession {
    fn signed_in() -> Self {
        Self::with(Ok(()))
    }

    fn with(verdict: Result<(), AuthorizationError>) -> Self {
        Self {
            verdict,
            authorize_calls: std::cell::Cell::new(0),
            store: CountingStore::default(),
        }
    }
}

impl SessionCapability for FixedSession {
    type Client = CountingStore;

    fn authorize(&self) -> Result<(), AuthorizationError> {
        self.authorize_calls.set(self.authorize_calls.get() + 1);
        self.verdict
    }

    fn client(&mut self) -> &mut CountingStore {
        &mut self.store
    }
}

fn rename(name: &str) -> ChangeSet {
    ChangeSet::for_fields(
        EntityKind::Profile,
        [("name", FieldValue::Text(name.to_string()))],
    )
    .unwrap()
}

#[test]
fn authorized_update_makes_exactly_one_store_call() {
    let mut session = FixedSession::signed_in();
    let id = Uuid::new_v4();
    let changes = rename("Ana");

    let outcome = dispatch_update(&mut session, id, &changes);

    assert_eq!(outcome, MutationOutcome::Succeeded);
    assert_eq!(outcome.state(), DispatchState::Succeeded);
    assert_eq!(session.authorize_calls.get(), 1);
    assert_eq!(session.store.updates, vec![(id, changes)]);
}

#[test]
fn unauthenticated_update_is_rejected_without_store_access() {
    let mut session = FixedSession::with(Err(AuthorizationError::NotSignedIn));

    let outcome = dispatch_update(&mut session, Uuid::new_v4(), &rename("Ana"));

    assert_eq!(
        outcome,
        MutationOutcome::Rejected(AuthorizationError::NotSignedIn)
    );
    assert_eq!(outcome.state(), DispatchState::Rejected);
    assert_eq!(session.store.calls(), 0);
}

#[test]
fn expired_bound_session_never_reaches_the_store() {
    let mut session = BoundSession::new(Uuid::new_v4(), 1, CountingStore::default());

    let outcome = dispatch_update(&mut session, Uuid::new_v4(), &rename("Ana"));

    assert!(matches!(
        outcome,
        MutationOutcome::Rejected(AuthorizationError::Expired { expires_at_ms: 1 })
    ));
    assert_eq!(session.into_client().calls(), 0);
}

#[test]
fn empty_change_set_succeeds_without_a_store_call() {
    let mut session = FixedSession::signed_in();

    let outcome = dispatch_update(
        &mut session,
        Uuid::new_v4(),
        &ChangeSet::empty(EntityKind::Note),
    );

    assert!(outcome.is_succeeded());
    assert_eq!(session.authorize_calls.get(), 1);
    assert_eq!(session.store.calls(), 0);
}

#[test]
fn empty_change_set_still_needs_a_valid_session() {
    let mut session = FixedSession::with(Err(AuthorizationError::NotSignedIn));

    let outcome = dispatch_update(
        &mut session,
        Uuid::new_v4(),
        &ChangeSet::empty(EntityKind::Note),
    );

    assert!(matches!(outcome, MutationOutcome::Rejected(_)));
}

#[test]
fn store_failure_is_reported_with_a_generic_message() {
    let mut session = FixedSession::signed_in();
    session.store.fail_with = Some("UNIQUE constraint failed: profiles.handle");

    let outcome = dispatch_update(&mut session, Uuid::new_v4(), &rename("Ana"));

    match &outcome {
        MutationOutcome::Failed(err) => assert!(err.reason().contains("UNIQUE")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.state(), DispatchState::Failed);
    assert!(!outcome.user_message().contains("UNIQUE"));
    assert_eq!(session.store.updates.len(), 1);
}

#[test]
fn bulk_delete_collapses_duplicates_into_one_call() {
    let mut session = FixedSession::signed_in();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let outcome = dispatch_delete(&mut session, EntityKind::Note, &[first, second, first]);

    assert!(outcome.is_succeeded());
    assert_eq!(session.store.deletes.len(), 1);
    let (kind, ids) = &session.store.deletes[0];
    assert_eq!(*kind, EntityKind::Note);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first) && ids.contains(&second));
}

#[test]
fn empty_delete_short_circuits_after_authorization() {
    let mut session = FixedSession::signed_in();
    assert!(dispatch_delete(&mut session, EntityKind::Note, &[]).is_succeeded());
    assert_eq!(session.authorize_calls.get(), 1);
    assert_eq!(session.store.calls(), 0);

    let mut session = FixedSession::with(Err(AuthorizationError::NotSignedIn));
    let outcome = dispatch_delete(&mut session, EntityKind::Note, &[Uuid::new_v4()]);
    assert!(matches!(outcome, MutationOutcome::Rejected(_)));
    assert_eq!(session.store.calls(), 0);
}
