use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use syllabus_core::store::{
    DeletedTopic, InMemoryTopicStore, StoreError, TomlTopicStore, TopicStore,
};
use syllabus_core::{NewTopic, OwnerId, Topic, TopicId, TopicPatch};
use syllabus_graph::{CyclePolicy, PrerequisiteGraphService, ServiceError, ValidationError};
use syllabus_util::errors::SyllabusError;

fn owner() -> OwnerId {
    OwnerId::from("ada")
}

fn service() -> (Arc<InMemoryTopicStore>, PrerequisiteGraphService) {
    let store = Arc::new(InMemoryTopicStore::new());
    let service = PrerequisiteGraphService::new(store.clone());
    (store, service)
}

async fn create(
    service: &PrerequisiteGraphService,
    name: &str,
    prerequisites: &[TopicId],
) -> Topic {
    service
        .create_topic(
            &owner(),
            NewTopic::new(name, None, prerequisites.iter().copied()),
        )
        .await
        .unwrap()
}

fn validation(err: ServiceError) -> ValidationError {
    match err {
        ServiceError::Validation(e) => e,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

fn names(topics: &[Topic]) -> Vec<&str> {
    topics.iter().map(|t| t.name.as_str()).collect()
}

#[tokio::test]
async fn chain_orders_prerequisites_first() {
    let (_, service) = service();
    let a = create(&service, "A", &[]).await;
    let b = create(&service, "B", &[a.id]).await;
    create(&service, "C", &[a.id, b.id]).await;

    let result = service.compute_order(&owner()).await.unwrap();
    assert!(!result.has_cycle);
    assert_eq!(names(&result.order), ["A", "B", "C"]);
    assert!(result.cycle_member_names.is_empty());
    assert_eq!(result.message, "Study order determined successfully.");
}

#[tokio::test]
async fn mutual_prerequisites_report_a_cycle() {
    let (_, service) = service();
    let a = create(&service, "A", &[]).await;
    let b = create(&service, "B", &[a.id]).await;
    service
        .update_topic(&owner(), &a.id, TopicPatch::new().prerequisites([b.id]))
        .await
        .unwrap();

    let result = service.compute_order(&owner()).await.unwrap();
    assert!(result.has_cycle);
    assert!(result.order.is_empty());
    assert_eq!(result.cycle_member_names, ["A", "B"]);
    assert_eq!(result.minimal_cycles, vec![vec!["A", "B"]]);
}

#[tokio::test]
async fn compute_order_is_deterministic() {
    let (_, service) = service();
    let calculus = create(&service, "Calculus", &[]).await;
    let algebra = create(&service, "Algebra", &[]).await;
    create(&service, "Topology", &[algebra.id]).await;
    create(&service, "Analysis", &[calculus.id, algebra.id]).await;
    create(&service, "Logic", &[]).await;

    let first = service.compute_order(&owner()).await.unwrap();
    let second = service.compute_order(&owner()).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        names(&first.order),
        ["Algebra", "Calculus", "Analysis", "Logic", "Topology"]
    );
}

#[tokio::test]
async fn order_respects_every_prerequisite_in_a_larger_graph() {
    let (_, service) = service();
    let mut created: Vec<Topic> = Vec::new();
    let mut seed: u64 = 0x5eed;
    for i in 0..40 {
        let mut prerequisites = Vec::new();
        for earlier in &created {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if (seed >> 33) % 5 == 0 {
                prerequisites.push(earlier.id);
            }
        }
        // Names deliberately disagree with creation order.
        let name = format!("topic-{:02}", (i * 17) % 40);
        created.push(create(&service, &name, &prerequisites).await);
    }

    let result = service.compute_order(&owner()).await.unwrap();
    assert!(!result.has_cycle);
    assert_eq!(result.order.len(), created.len());

    let position: std::collections::HashMap<TopicId, usize> = result
        .order
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, i))
        .collect();
    assert_eq!(position.len(), created.len());
    for topic in &result.order {
        for prerequisite in &topic.prerequisites {
            assert!(
                position[prerequisite] < position[&topic.id],
                "{} placed before its prerequisite",
                topic.name
            );
        }
    }
}

#[tokio::test]
async fn delete_cascades_into_dependents() {
    let (_, service) = service();
    let a = create(&service, "A", &[]).await;
    let b = create(&service, "B", &[a.id]).await;
    let c = create(&service, "C", &[a.id, b.id]).await;

    let deleted = service.delete_topic(&owner(), &b.id).await.unwrap();
    assert_eq!(deleted.id, b.id);

    let c_now = service.get_topic(&owner(), &c.id).await.unwrap();
    assert_eq!(c_now.prerequisites, vec![a.id]);

    let result = service.compute_order(&owner()).await.unwrap();
    assert!(result.dangling.is_empty());
    assert_eq!(names(&result.order), ["A", "C"]);
}

/// An in-memory store that refuses to delete.
struct NoDeleteStore(InMemoryTopicStore);

#[async_trait]
impl TopicStore for NoDeleteStore {
    async fn list_topics(&self, owner: &OwnerId) -> syllabus_core::store::Result<Vec<Topic>> {
        self.0.list_topics(owner).await
    }
    async fn get_topic(
        &self,
        owner: &OwnerId,
        id: &TopicId,
    ) -> syllabus_core::store::Result<Option<Topic>> {
        self.0.get_topic(owner, id).await
    }
    async fn insert_topic(
        &self,
        owner: &OwnerId,
        topic: NewTopic,
    ) -> syllabus_core::store::Result<Topic> {
        self.0.insert_topic(owner, topic).await
    }
    async fn replace_topic(&self, topic: &Topic) -> syllabus_core::store::Result<()> {
        self.0.replace_topic(topic).await
    }
    async fn delete_topic(
        &self,
        _: &OwnerId,
        _: &TopicId,
    ) -> syllabus_core::store::Result<Option<DeletedTopic>> {
        Err(StoreError::Unavailable("read-only".into()))
    }
}

#[tokio::test]
async fn failed_delete_leaves_topic_and_dependents_intact() {
    let store = NoDeleteStore(InMemoryTopicStore::new());
    let service = PrerequisiteGraphService::new(Arc::new(store));
    let b = create(&service, "B", &[]).await;
    let c = create(&service, "C", &[b.id]).await;

    let err = service.delete_topic(&owner(), &b.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));

    assert_eq!(service.get_topic(&owner(), &b.id).await.unwrap(), b);
    assert_eq!(service.get_topic(&owner(), &c.id).await.unwrap(), c);
    let result = service.compute_order(&owner()).await.unwrap();
    assert!(result.dangling.is_empty());
    assert_eq!(names(&result.order), ["B", "C"]);
}

#[tokio::test]
async fn delete_of_unknown_topic_is_not_found() {
    let (_, service) = service();
    let id = TopicId::generate();
    let err = service.delete_topic(&owner(), &id).await.unwrap_err();
    assert_eq!(validation(err), ValidationError::NotFound { id });
}

#[tokio::test]
async fn self_reference_leaves_topic_unchanged() {
    let (_, service) = service();
    let a = create(&service, "A", &[]).await;

    let err = service
        .update_topic(
            &owner(),
            &a.id,
            TopicPatch::new().name("Renamed").prerequisites([a.id]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::SelfReference {
            id: a.id,
            name: "A".into()
        }
    );

    let stored = service.get_topic(&owner(), &a.id).await.unwrap();
    assert_eq!(stored, a);
}

#[tokio::test]
async fn create_rejects_duplicates_and_unknown_prerequisites() {
    let (store, service) = service();
    create(&service, "A", &[]).await;

    let err = service
        .create_topic(&owner(), NewTopic::new("A", None, Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::DuplicateName { .. }
    ));

    let ghost = TopicId::generate();
    let err = service
        .create_topic(&owner(), NewTopic::new("B", None, [ghost]))
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::InvalidPrerequisite { ids: vec![ghost] }
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn literal_requests_cannot_sneak_past_name_uniqueness() {
    let (store, service) = service();
    create(&service, "Algebra", &[]).await;
    let b = create(&service, "B", &[]).await;

    let err = service
        .create_topic(
            &owner(),
            NewTopic {
                name: "Algebra ".into(),
                description: None,
                prerequisites: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::DuplicateName {
            name: "Algebra".into()
        }
    );

    let patch = TopicPatch {
        name: Some(" Algebra".into()),
        description: None,
        prerequisites: None,
    };
    let err = service.update_topic(&owner(), &b.id, patch).await.unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::DuplicateName { .. }
    ));

    let created = service
        .create_topic(
            &owner(),
            NewTopic {
                name: "  Geometry ".into(),
                description: None,
                prerequisites: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.name, "Geometry");
    let stored = store.list_topics(&owner()).await.unwrap();
    assert_eq!(names(&stored), ["Algebra", "B", "Geometry"]);
}

#[tokio::test]
async fn rejections_keep_their_help_for_the_cli() {
    let (_, service) = service();
    create(&service, "A", &[]).await;
    let err = service
        .create_topic(&owner(), NewTopic::new("A", None, Vec::new()))
        .await
        .unwrap_err();

    let err = SyllabusError::from(err);
    assert_eq!(err.to_string(), "Rejected: a topic named 'A' already exists");
    let help = err.help().map(|h| h.to_string());
    assert_eq!(
        help.as_deref(),
        Some("topic names are unique per owner; pick another name")
    );
}

#[tokio::test]
async fn update_bumps_updated_at_only() {
    let (_, service) = service();
    let a = create(&service, "A", &[]).await;

    let updated = service
        .update_topic(&owner(), &a.id, TopicPatch::new().description("basics"))
        .await
        .unwrap();
    assert_eq!(updated.created_at, a.created_at);
    assert!(updated.updated_at >= a.updated_at);
    assert_eq!(service.get_topic(&owner(), &a.id).await.unwrap(), updated);
}

#[tokio::test]
async fn prerequisites_must_belong_to_the_same_owner() {
    let (_, service) = service();
    let bob = OwnerId::from("bob");
    let foreign = service
        .create_topic(&bob, NewTopic::new("Bob's topic", None, Vec::new()))
        .await
        .unwrap();

    let err = service
        .create_topic(&owner(), NewTopic::new("Mine", None, [foreign.id]))
        .await
        .unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::InvalidPrerequisite { .. }
    ));

    // Same name under another owner is fine.
    service
        .create_topic(&owner(), NewTopic::new("Bob's topic", None, Vec::new()))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_of_foreign_topic_is_not_found() {
    let (_, service) = service();
    let bob = OwnerId::from("bob");
    let foreign = service
        .create_topic(&bob, NewTopic::new("B", None, Vec::new()))
        .await
        .unwrap();
    let err = service
        .update_topic(&owner(), &foreign.id, TopicPatch::new().name("Stolen"))
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::NotFound { id: foreign.id }
    );
}

#[tokio::test]
async fn reject_policy_refuses_cycles_at_mutation_time() {
    let store = Arc::new(InMemoryTopicStore::new());
    let service =
        PrerequisiteGraphService::new(store).with_cycle_policy(CyclePolicy::Reject);
    let a = create(&service, "A", &[]).await;
    let b = create(&service, "B", &[a.id]).await;

    let err = service
        .update_topic(&owner(), &a.id, TopicPatch::new().prerequisites([b.id]))
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::CycleRejected {
            topic: "A".into(),
            prerequisite: "B".into(),
        }
    );
    assert!(!service.compute_order(&owner()).await.unwrap().has_cycle);
}

#[tokio::test]
async fn dangling_references_are_surfaced_as_warnings() {
    let (store, service) = service();
    let ghost = TopicId::generate();
    let a = Topic::new(owner(), "A", vec![ghost]);
    store.import(a.clone()).await;

    let result = service.compute_order(&owner()).await.unwrap();
    assert!(!result.has_cycle);
    assert_eq!(names(&result.order), ["A"]);
    assert_eq!(result.dangling.len(), 1);
    assert_eq!(result.dangling[0].prerequisite, ghost);
    assert_eq!(result.dangling[0].topic, a.id);
}

#[tokio::test]
async fn cached_order_is_invalidated_by_mutations() {
    let store = Arc::new(InMemoryTopicStore::new());
    let service = PrerequisiteGraphService::new(store.clone()).with_order_cache(true);
    let a = create(&service, "A", &[]).await;
    assert_eq!(names(&service.compute_order(&owner()).await.unwrap().order), ["A"]);

    // A write that bypasses the service is not seen while the cache is warm.
    store
        .import(Topic::new(owner(), "Hidden", Vec::new()))
        .await;
    assert_eq!(names(&service.compute_order(&owner()).await.unwrap().order), ["A"]);

    create(&service, "B", &[a.id]).await;
    assert_eq!(
        names(&service.compute_order(&owner()).await.unwrap().order),
        ["A", "B", "Hidden"]
    );
}

#[tokio::test]
async fn concurrent_creates_with_same_name_admit_exactly_one() {
    let store = Arc::new(InMemoryTopicStore::new());
    let service = Arc::new(PrerequisiteGraphService::new(store.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .create_topic(&owner(), NewTopic::new("Race", None, Vec::new()))
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(err) => assert!(matches!(
                validation(err),
                ValidationError::DuplicateName { .. }
            )),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn service_works_over_the_toml_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = Arc::new(TomlTopicStore::new(tmp.path().join("topics.toml")));
    let service = PrerequisiteGraphService::new(store);
    let a = create(&service, "A", &[]).await;
    let b = create(&service, "B", &[a.id]).await;
    service.delete_topic(&owner(), &a.id).await.unwrap();

    let b_now = service.get_topic(&owner(), &b.id).await.unwrap();
    assert!(b_now.prerequisites.is_empty());
}

/// A store whose every call fails.
struct BrokenStore;

#[async_trait]
impl TopicStore for BrokenStore {
    async fn list_topics(&self, _: &OwnerId) -> syllabus_core::store::Result<Vec<Topic>> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    async fn get_topic(
        &self,
        _: &OwnerId,
        _: &TopicId,
    ) -> syllabus_core::store::Result<Option<Topic>> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    async fn insert_topic(
        &self,
        _: &OwnerId,
        _: NewTopic,
    ) -> syllabus_core::store::Result<Topic> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    async fn replace_topic(&self, _: &Topic) -> syllabus_core::store::Result<()> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    async fn delete_topic(
        &self,
        _: &OwnerId,
        _: &TopicId,
    ) -> syllabus_core::store::Result<Option<DeletedTopic>> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
}

#[tokio::test]
async fn store_failures_propagate_unmodified() {
    let service = PrerequisiteGraphService::new(Arc::new(BrokenStore));

    let err = service.compute_order(&owner()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
    assert_eq!(err.to_string(), "store unavailable: disk on fire");

    let err = service
        .create_topic(&owner(), NewTopic::new("A", None, Vec::new()))
        .await
        .unwrap_err();
    assert!(err.validation().is_none());
}
