// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session - the single owner of registry, relations, trees, selection,
//! visibility and layout
//!
//! Every state change takes the session lock once and releases it before
//! listeners are notified. Decoding and tree building run without the
//! lock; their results are committed only if the model is still
//! registered.

use crate::classifier::{
    ClassificationEntry, ClassificationSystem, ClassificationTree, Classifier,
};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventBus, SessionEvent, SubscriptionId};
use crate::indexer::{RelationGraph, RelationIndexer};
use crate::layout::{Layout, LayoutCoordinator, LayoutEvent};
use crate::properties;
use crate::registry::{ModelRegistry, Removal};
use crate::selection::{SelectMode, SelectionSet};
use crate::visibility::VisibilityState;
use frag_viewer_model::{
    CodecError, ElementId, ElementKey, FragmentCodec, FragmentFormat, LoaderSettings, Model,
    ModelData, ModelId, NativeCodec, PropertySet, PropertyValue, RelationKind, SourceLoader,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Engine state guarded by the session lock
#[derive(Debug, Default)]
struct SessionState {
    registry: ModelRegistry,
    indexer: RelationIndexer,
    classifier: Classifier,
    selection: SelectionSet,
    visibility: VisibilityState,
    layout: LayoutCoordinator,
}

impl SessionState {
    /// Drop everything derived from a removed model
    fn purge(&mut self, id: ModelId, events: &mut Vec<SessionEvent>) {
        self.indexer.remove(id);
        self.classifier.remove_model(id);
        events.push(SessionEvent::ModelDisposed(id));
        if self.visibility.remove_model(id) {
            events.push(SessionEvent::VisibilityChanged);
        }
        if self.selection.clear_model(id) {
            self.selection_changed(events);
        }
    }

    fn selection_changed(&mut self, events: &mut Vec<SessionEvent>) {
        events.push(SessionEvent::SelectionChanged);
        let event = if self.selection.is_empty() {
            LayoutEvent::Clear
        } else {
            LayoutEvent::Highlight
        };
        self.apply_layout(event, events);
    }

    fn apply_layout(&mut self, event: LayoutEvent, events: &mut Vec<SessionEvent>) {
        if let Some(layout) = self.layout.apply(event) {
            events.push(SessionEvent::LayoutChanged(layout));
        }
    }

    fn model(&self, id: ModelId) -> Result<Arc<Model>> {
        self.registry.get(id).ok_or(SessionError::UnknownModel(id))
    }
}

struct Inner {
    config: SessionConfig,
    codec: Arc<dyn FragmentCodec>,
    source_loader: Option<Arc<dyn SourceLoader>>,
    state: RwLock<SessionState>,
    events: EventBus,
}

/// Handle to a viewer session
///
/// Cloning is cheap; clones share the same state. Independent sessions
/// share nothing.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.read())
            .field("events", &self.inner.events)
            .finish()
    }
}

impl Session {
    /// Session using the native codec and default configuration
    pub fn new() -> Self {
        SessionBuilder::new().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Decode a buffer and register the resulting model
    ///
    /// The identifier is not visible until decoding finishes. When the
    /// model carries property data and `auto_process` is on, indexing and
    /// classification run before this returns. If the model is disposed
    /// while still decoding, it is dropped on arrival and never announced.
    pub async fn load(&self, bytes: Vec<u8>, format: FragmentFormat) -> Result<ModelId> {
        if bytes.is_empty() {
            log::warn!("Rejected load: empty input buffer");
            return Err(SessionError::EmptyInput);
        }

        let id = self
            .inner
            .state
            .write()
            .registry
            .reserve()
            .ok_or(SessionError::IdsExhausted)?;
        log::info!("{}: loading {} bytes ({:?})", id, bytes.len(), format);

        let codec = Arc::clone(&self.inner.codec);
        let loader = self.inner.source_loader.clone();
        let settings = self.inner.config.loader.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            decode_buffer(codec.as_ref(), loader.as_deref(), &settings, bytes, format)
        })
        .await;

        let (data, buffer) = match decoded {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(e)) => {
                self.inner.state.write().registry.abort(id);
                log::warn!("{}: load failed: {}", id, e);
                return Err(e);
            }
            Err(e) => {
                self.inner.state.write().registry.abort(id);
                log::warn!("{}: decode worker failed: {}", id, e);
                return Err(SessionError::Worker(e.to_string()));
            }
        };

        let has_properties = data.has_properties;
        let committed = self.inner.state.write().registry.commit(id, data, buffer);
        let Some(model) = committed else {
            log::info!("{}: disposed while loading, dropped", id);
            return Ok(id);
        };
        log::info!(
            "{}: registered '{}' with {} elements",
            id,
            model.name(),
            model.element_count()
        );
        self.inner.events.emit(SessionEvent::ModelLoaded(id));

        if has_properties && self.inner.config.auto_process {
            match self.process(id).await {
                Ok(()) => {}
                // Disposed between registration and processing
                Err(SessionError::UnknownModel(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(id)
    }

    /// Index relations, then classify, as one chain
    pub async fn process(&self, id: ModelId) -> Result<()> {
        self.index(id)?;
        tokio::task::yield_now().await;
        self.classify(id)
    }

    /// Registered model
    pub fn get(&self, id: ModelId) -> Result<Arc<Model>> {
        self.inner.state.read().model(id)
    }

    /// Registered identifiers in load order
    pub fn model_ids(&self) -> Vec<ModelId> {
        self.inner.state.read().registry.ids()
    }

    /// Native fragment buffer of a registered model
    pub fn export(&self, id: ModelId) -> Result<Vec<u8>> {
        let model = self.get(id)?;
        if !model.buffer().is_empty() {
            return Ok(model.buffer().to_vec());
        }
        self.inner.codec.encode(model.data()).map_err(SessionError::Encode)
    }

    /// Export buffer paired with the configured download file name
    pub fn export_file(&self, id: ModelId) -> Result<(String, Vec<u8>)> {
        let bytes = self.export(id)?;
        Ok((self.inner.config.export_file_name.clone(), bytes))
    }

    /// Remove a model together with its relations, trees, selection and
    /// visibility entries
    ///
    /// A model still loading is disposed as soon as its load completes.
    /// Unknown identifiers are ignored. Returns whether a registered model
    /// was removed.
    pub fn dispose(&self, id: ModelId) -> bool {
        let mut events = Vec::new();
        let removed = {
            let mut state = self.inner.state.write();
            match state.registry.remove(id) {
                Removal::Removed(_) => {
                    state.purge(id, &mut events);
                    true
                }
                Removal::Deferred => {
                    log::info!("{}: dispose deferred until load completes", id);
                    false
                }
                Removal::Unknown => {
                    log::debug!("{}: dispose ignored (not registered)", id);
                    false
                }
            }
        };
        if removed {
            log::info!("{}: disposed", id);
        }
        self.inner.events.emit_all(&events);
        removed
    }

    /// Dispose every registered model and every in-flight load
    pub fn dispose_all(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.inner.state.write();
            for id in state.registry.ids() {
                if let Removal::Removed(_) = state.registry.remove(id) {
                    state.purge(id, &mut events);
                }
            }
            let deferred = state.registry.defer_pending();
            if deferred > 0 {
                log::info!("{} in-flight load(s) will be disposed on completion", deferred);
            }
        }
        self.inner.events.emit_all(&events);
    }

    // ------------------------------------------------------------------
    // Relations and classification
    // ------------------------------------------------------------------

    /// Build the relation graph of a model, replacing any previous graph
    ///
    /// No-op for models without property data.
    pub fn index(&self, id: ModelId) -> Result<()> {
        let model = self.get(id)?;
        if !model.has_properties() {
            log::debug!("{}: no property data, not indexed", id);
            return Ok(());
        }
        let graph = RelationGraph::build(&model);

        {
            let mut state = self.inner.state.write();
            if !state.registry.contains(id) {
                return Err(SessionError::UnknownModel(id));
            }
            state.indexer.insert(id, graph);
        }
        self.inner.events.emit(SessionEvent::RelationsIndexed(id));
        Ok(())
    }

    /// Build both classification trees of a model
    pub fn classify(&self, id: ModelId) -> Result<()> {
        self.classify_by_entity(id)?;
        self.classify_by_spatial_structure(id)
    }

    /// Group a model's elements by declared type
    pub fn classify_by_entity(&self, id: ModelId) -> Result<()> {
        let model = self.get(id)?;
        let tree = Classifier::build_entity_tree(&model);
        self.store_tree(tree)
    }

    /// Group a model's elements by spatial hierarchy
    ///
    /// Falls back to a single group of every element when the model has no
    /// containment relations.
    pub fn classify_by_spatial_structure(&self, id: ModelId) -> Result<()> {
        let (model, graph) = {
            let state = self.inner.state.read();
            (state.model(id)?, state.indexer.graph(id).cloned())
        };
        let tree = Classifier::build_spatial_tree(&model, graph.as_ref());
        self.store_tree(tree)
    }

    fn store_tree(&self, tree: ClassificationTree) -> Result<()> {
        let event = SessionEvent::ClassificationUpdated {
            model: tree.model,
            system: tree.system,
        };
        {
            let mut state = self.inner.state.write();
            if !state.registry.contains(tree.model) {
                return Err(SessionError::UnknownModel(tree.model));
            }
            state.classifier.insert(tree);
        }
        self.inner.events.emit(event);
        Ok(())
    }

    /// Relation targets; empty when nothing matches
    pub fn get_relations(
        &self,
        model: ModelId,
        element: ElementId,
        kind: RelationKind,
    ) -> Vec<ElementId> {
        self.inner
            .state
            .read()
            .indexer
            .get_relations(model, element, kind)
    }

    /// Whether a relation graph is stored for the model
    pub fn is_indexed(&self, model: ModelId) -> bool {
        self.inner.state.read().indexer.is_indexed(model)
    }

    /// Current tree of a model under one system
    pub fn classification(
        &self,
        model: ModelId,
        system: ClassificationSystem,
    ) -> Option<ClassificationTree> {
        self.inner
            .state
            .read()
            .classifier
            .get(model, system)
            .cloned()
    }

    /// Systems a model has trees for
    pub fn classification_systems(&self, model: ModelId) -> Vec<ClassificationSystem> {
        self.inner.state.read().classifier.systems(model)
    }

    /// Systems offered to the classification panel
    pub fn classifications(&self) -> Vec<ClassificationEntry> {
        Classifier::classifications()
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Property name → value mapping of one element
    pub fn get_properties(
        &self,
        model: ModelId,
        element: ElementId,
    ) -> Result<BTreeMap<String, PropertyValue>> {
        let model = self.get(model)?;
        Ok(properties::get_properties(&model, element))
    }

    /// Property sets of one element, filtered by an optional search query
    pub fn property_table(
        &self,
        model: ModelId,
        element: ElementId,
        query: Option<&str>,
    ) -> Result<Vec<PropertySet>> {
        let state = self.inner.state.read();
        let m = state.model(model)?;
        Ok(properties::property_table(
            &m,
            state.indexer.graph(model),
            element,
            query,
        ))
    }

    /// Property sets of every selected element
    pub fn selection_properties(&self, query: Option<&str>) -> Vec<(ElementKey, Vec<PropertySet>)> {
        let state = self.inner.state.read();
        state
            .selection
            .keys()
            .filter_map(|key| {
                let model = state.registry.model(key.model)?;
                let graph = state.indexer.graph(key.model);
                let sets = properties::property_table(model, graph, key.element, query);
                Some((key, sets))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Change the selection of a model
    ///
    /// Elements that are not registered are skipped. Returns whether the
    /// selection changed.
    pub fn select(
        &self,
        model: ModelId,
        ids: impl IntoIterator<Item = ElementId>,
        mode: SelectMode,
    ) -> bool {
        let mut events = Vec::new();
        let changed = {
            let mut state = self.inner.state.write();
            let target = state.registry.get(model);
            let changed = state.selection.apply(model, target.as_deref(), ids, mode);
            if changed {
                state.selection_changed(&mut events);
            }
            changed
        };
        self.inner.events.emit_all(&events);
        changed
    }

    /// Empty the selection across all models
    pub fn clear_selection(&self) -> bool {
        let mut events = Vec::new();
        let changed = {
            let mut state = self.inner.state.write();
            let changed = state.selection.clear();
            if changed {
                state.selection_changed(&mut events);
            }
            changed
        };
        self.inner.events.emit_all(&events);
        changed
    }

    /// Snapshot of the current selection
    pub fn selection(&self) -> SelectionSet {
        self.inner.state.read().selection.clone()
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Flip each element's visibility independently
    ///
    /// Returns the number of elements flipped; missing elements and
    /// unknown models are skipped.
    pub fn toggle_visibility(
        &self,
        model: ModelId,
        ids: impl IntoIterator<Item = ElementId>,
    ) -> usize {
        let flipped = {
            let mut state = self.inner.state.write();
            let SessionState {
                registry,
                visibility,
                ..
            } = &mut *state;
            match registry.model(model) {
                Some(m) => visibility.toggle(m, ids),
                None => {
                    log::debug!("toggle: {} not registered", model);
                    0
                }
            }
        };
        if flipped > 0 {
            self.inner.events.emit(SessionEvent::VisibilityChanged);
        }
        flipped
    }

    /// Toggle every selected element
    pub fn toggle_selection_visibility(&self) -> usize {
        let flipped = {
            let mut state = self.inner.state.write();
            let SessionState {
                registry,
                visibility,
                selection,
                ..
            } = &mut *state;
            selection
                .iter()
                .filter_map(|(id, elements)| {
                    registry
                        .model(id)
                        .map(|m| visibility.toggle(m, elements.iter().copied()))
                })
                .sum::<usize>()
        };
        if flipped > 0 {
            self.inner.events.emit(SessionEvent::VisibilityChanged);
        }
        flipped
    }

    /// Show only the snapshot's elements, hiding everything else
    ///
    /// An empty snapshot, or one naming no registered element, changes
    /// nothing.
    pub fn isolate(&self, snapshot: &SelectionSet) -> bool {
        let changed = {
            let mut state = self.inner.state.write();
            let SessionState {
                registry,
                visibility,
                ..
            } = &mut *state;
            visibility.isolate(registry.iter(), snapshot)
        };
        if changed {
            self.inner.events.emit(SessionEvent::VisibilityChanged);
        }
        changed
    }

    /// Isolate the current selection
    pub fn isolate_selection(&self) -> bool {
        let snapshot = self.selection();
        self.isolate(&snapshot)
    }

    /// Make every element of every model visible
    pub fn show_all(&self) -> bool {
        let changed = self.inner.state.write().visibility.show_all();
        if changed {
            self.inner.events.emit(SessionEvent::VisibilityChanged);
        }
        changed
    }

    /// Whether a registered element is visible
    pub fn is_visible(&self, model: ModelId, element: ElementId) -> bool {
        let state = self.inner.state.read();
        state
            .registry
            .model(model)
            .is_some_and(|m| m.contains(element))
            && state.visibility.is_visible(model, element)
    }

    /// Hidden elements of a model, sorted
    pub fn hidden_elements(&self, model: ModelId) -> Vec<ElementId> {
        self.inner.state.read().visibility.hidden(model)
    }

    pub fn hidden_count(&self) -> usize {
        self.inner.state.read().visibility.hidden_count()
    }

    /// Visible elements across every registered model
    pub fn visible_count(&self) -> usize {
        let state = self.inner.state.read();
        let total: usize = state.registry.iter().map(Model::element_count).sum();
        total.saturating_sub(state.visibility.hidden_count())
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    pub fn layout(&self) -> Layout {
        self.inner.state.read().layout.current()
    }

    /// Toggle the classifier layout
    pub fn show_classifier(&self) -> Layout {
        self.navigate(LayoutEvent::ShowClassifier)
    }

    /// Switch to the world settings layout
    pub fn show_world_settings(&self) -> Layout {
        self.navigate(LayoutEvent::ShowWorld)
    }

    fn navigate(&self, event: LayoutEvent) -> Layout {
        let mut events = Vec::new();
        let layout = {
            let mut state = self.inner.state.write();
            state.apply_layout(event, &mut events);
            state.layout.current()
        };
        self.inner.events.emit_all(&events);
        layout
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener for session events
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }
}

/// Decode a load buffer into model content plus the native buffer to keep
fn decode_buffer(
    codec: &dyn FragmentCodec,
    loader: Option<&dyn SourceLoader>,
    settings: &LoaderSettings,
    bytes: Vec<u8>,
    format: FragmentFormat,
) -> Result<(ModelData, Vec<u8>)> {
    match format {
        FragmentFormat::Native => {
            let data = codec.decode(&bytes)?;
            Ok((data, bytes))
        }
        FragmentFormat::Source => {
            let loader =
                loader.ok_or_else(|| CodecError::conversion("no source loader configured"))?;
            let data = loader.load(&bytes, settings)?;
            data.validate()?;
            let buffer = codec.encode(&data).map_err(SessionError::Encode)?;
            Ok((data, buffer))
        }
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    config: SessionConfig,
    codec: Arc<dyn FragmentCodec>,
    source_loader: Option<Arc<dyn SourceLoader>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            codec: Arc::new(NativeCodec::new()),
            source_loader: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the native fragment codec
    pub fn codec(mut self, codec: impl FragmentCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Converter used for [`FragmentFormat::Source`] loads
    pub fn source_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.source_loader = Some(Arc::new(loader));
        self
    }

    pub fn build(self) -> Session {
        Session {
            inner: Arc::new(Inner {
                config: self.config,
                codec: self.codec,
                source_loader: self.source_loader,
                state: RwLock::new(SessionState::default()),
                events: EventBus::new(),
            }),
        }
    }
}
