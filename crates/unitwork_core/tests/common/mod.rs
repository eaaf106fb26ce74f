#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use unitwork_core::{
    BackendResult, CallbackIdentifier, Entity, EntityHandle, EntityId, EntryState,
    IdentifierResolver, InMemoryRepository, Metadata, MetadataRegistry, Persistable, Reference,
    Relation, Repository, RepositoryManager, Transaction, UowError, UowResult,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub post_refs: Vec<Reference>,
    #[serde(skip)]
    pub loaded_posts: Vec<EntityHandle>,
}

impl Persistable for Author {
    const ENTITY_TYPE: &'static str = "Author";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<u32>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Box<Author>>,
    #[serde(default)]
    pub author_ref: Option<Reference>,
    #[serde(skip)]
    pub loaded_author: Option<EntityHandle>,
}

impl Persistable for Post {
    const ENTITY_TYPE: &'static str = "Post";
}

/// Entity type that is never registered with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stray {
    pub id: String,
}

impl Persistable for Stray {
    const ENTITY_TYPE: &'static str = "Stray";
}

pub fn author(id: &str, name: &str) -> Author {
    Author {
        id: Some(id.to_string()),
        name: name.to_string(),
        ..Author::default()
    }
}

pub fn post(id: u32, title: &str) -> Post {
    Post {
        id: Some(id),
        title: title.to_string(),
        ..Post::default()
    }
}

pub fn author_identifier() -> Arc<dyn IdentifierResolver> {
    Arc::new(CallbackIdentifier::<Author, _>::new(|author: &Author| {
        author.id.clone().map(EntityId::from)
    }))
}

pub fn post_identifier() -> Arc<dyn IdentifierResolver> {
    Arc::new(CallbackIdentifier::<Post, _>::new(|post: &Post| {
        post.id.map(EntityId::from)
    }))
}

pub fn stray_identifier() -> Arc<dyn IdentifierResolver> {
    Arc::new(CallbackIdentifier::<Stray, _>::new(|stray: &Stray| {
        Some(EntityId::from(stray.id.as_str()))
    }))
}

/// Cascades an author's embedded posts on save and resolves them on load.
pub struct AuthorPostsRelation;

impl Relation for AuthorPostsRelation {
    fn prepare_to_save(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        let author = object
            .downcast_mut::<Author>()
            .ok_or_else(|| UowError::relation("Author", "expected an Author"))?;
        let posts = std::mem::take(&mut author.posts);
        for post in &posts {
            let reference = transaction.save(post)?;
            if !author.post_refs.contains(&reference) {
                author.post_refs.push(reference);
            }
        }
        Ok(())
    }

    fn prepare_to_load(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        let author = object
            .downcast_mut::<Author>()
            .ok_or_else(|| UowError::relation("Author", "expected an Author"))?;
        for reference in author.post_refs.clone() {
            if let Some(handle) = transaction.find_by_reference(&reference)? {
                author.loaded_posts.push(handle);
            }
        }
        Ok(())
    }
}

/// Saves a post's embedded author and keeps only its reference.
pub struct PostAuthorRelation;

impl Relation for PostAuthorRelation {
    fn prepare_to_save(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        let post = object
            .downcast_mut::<Post>()
            .ok_or_else(|| UowError::relation("Post", "expected a Post"))?;
        if let Some(author) = post.author.take() {
            post.author_ref = Some(transaction.save(&*author)?);
        }
        Ok(())
    }

    fn prepare_to_load(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        let post = object
            .downcast_mut::<Post>()
            .ok_or_else(|| UowError::relation("Post", "expected a Post"))?;
        if let Some(reference) = post.author_ref.clone() {
            post.loaded_author = transaction.find_by_reference(&reference)?;
        }
        Ok(())
    }
}

/// One hook invocation seen by [`RecordingRelation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub relation: &'static str,
    pub phase: &'static str,
    pub entity_type: String,
    pub address: usize,
}

pub type HookLog = Arc<Mutex<Vec<HookCall>>>;

pub fn hook_log() -> HookLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn address_of(object: &dyn Entity) -> usize {
    object as *const dyn Entity as *const () as usize
}

/// Records every hook call with the address of the object it received.
pub struct RecordingRelation {
    pub name: &'static str,
    pub log: HookLog,
}

impl RecordingRelation {
    fn record(&self, phase: &'static str, object: &dyn Entity) {
        self.log.lock().expect("hook log lock").push(HookCall {
            relation: self.name,
            phase,
            entity_type: object.entity_type().to_string(),
            address: address_of(object),
        });
    }
}

impl Relation for RecordingRelation {
    fn prepare_to_save(
        &self,
        _transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        self.record("save", object);
        Ok(())
    }

    fn prepare_to_load(
        &self,
        _transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        self.record("load", object);
        Ok(())
    }
}

/// Captures the identity-map state of `watched` whenever its hooks run.
pub struct ObserverRelation {
    pub watched: Reference,
    pub seen: Arc<Mutex<Vec<Option<EntryState>>>>,
}

impl Relation for ObserverRelation {
    fn prepare_to_save(
        &self,
        transaction: &mut Transaction<'_>,
        _object: &mut dyn Entity,
    ) -> UowResult<()> {
        self.seen
            .lock()
            .expect("observer lock")
            .push(transaction.entry_state(&self.watched));
        Ok(())
    }

    fn prepare_to_load(
        &self,
        transaction: &mut Transaction<'_>,
        _object: &mut dyn Entity,
    ) -> UowResult<()> {
        self.seen
            .lock()
            .expect("observer lock")
            .push(transaction.entry_state(&self.watched));
        Ok(())
    }
}

/// Repository decorator counting backend calls.
pub struct CountingRepository {
    inner: Rc<dyn Repository>,
    saves: Cell<usize>,
    finds: Cell<usize>,
    get_alls: Cell<usize>,
}

impl CountingRepository {
    pub fn new(inner: Rc<dyn Repository>) -> Rc<Self> {
        Rc::new(Self {
            inner,
            saves: Cell::new(0),
            finds: Cell::new(0),
            get_alls: Cell::new(0),
        })
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn finds(&self) -> usize {
        self.finds.get()
    }

    pub fn get_alls(&self) -> usize {
        self.get_alls.get()
    }

    pub fn total_calls(&self) -> usize {
        self.saves() + self.finds() + self.get_alls()
    }
}

impl Repository for CountingRepository {
    fn save(&self, object: &dyn Entity) -> BackendResult<()> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save(object)
    }

    fn find_by_id(&self, id: &EntityId) -> BackendResult<Option<Box<dyn Entity>>> {
        self.finds.set(self.finds.get() + 1);
        self.inner.find_by_id(id)
    }

    fn get_all(&self) -> BackendResult<Vec<Box<dyn Entity>>> {
        self.get_alls.set(self.get_alls.get() + 1);
        self.inner.get_all()
    }
}

pub fn author_metadata() -> Metadata {
    Metadata::new(author_identifier()).with_relation(AuthorPostsRelation)
}

pub fn post_metadata() -> Metadata {
    Metadata::new(post_identifier()).with_relation(PostAuthorRelation)
}

/// Blog fixture: Author/Post metadata and counted backends.
pub struct Blog {
    pub registry: MetadataRegistry,
    pub repositories: RepositoryManager,
    pub authors: Rc<CountingRepository>,
    pub posts: Rc<CountingRepository>,
}

impl Blog {
    pub fn in_memory() -> Self {
        Self::with_metadata(author_metadata(), post_metadata())
    }

    pub fn with_metadata(author_metadata: Metadata, post_metadata: Metadata) -> Self {
        Self::with_backends(
            author_metadata,
            post_metadata,
            Rc::new(InMemoryRepository::<Author>::new(author_identifier())),
            Rc::new(InMemoryRepository::<Post>::new(post_identifier())),
        )
    }

    pub fn with_backends(
        author_metadata: Metadata,
        post_metadata: Metadata,
        authors: Rc<dyn Repository>,
        posts: Rc<dyn Repository>,
    ) -> Self {
        let mut registry = MetadataRegistry::new();
        registry.add_metadata("Author", author_metadata);
        registry.add_metadata("Post", post_metadata);

        let authors = CountingRepository::new(authors);
        let posts = CountingRepository::new(posts);
        let mut repositories = RepositoryManager::new();
        repositories.add_repository("Author", authors.clone());
        repositories.add_repository("Post", posts.clone());

        Self {
            registry,
            repositories,
            authors,
            posts,
        }
    }

    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(&self.registry, &self.repositories)
    }
}
