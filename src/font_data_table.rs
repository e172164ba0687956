//! The ownership and lifecycle contract shared by tables, subtables and their builders.
//!
//! A read-only table owns one `ReadableFontData`. A builder owns either a writable or a readable
//! copy of the raw bytes, plus whatever decoded model the concrete builder keeps in its
//! `BuilderHooks`. `FontDataTableBuilder` implements the orchestration once: it tracks which
//! representation is current, serializes the model when it has been touched, and turns the
//! result into a new read-only value on `build`.

use std::cell::Cell;
use std::fmt;
use std::io;
use std::rc::Rc;

use log::trace;

use crate::binary::read::ReadScope;
use crate::binary::write::WriteContext;
use crate::error::{ParseError, ReadWriteError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};

/// A value backed by font data.
pub trait FontDataTable {
    fn read_font_data(&self) -> &ReadableFontData;

    fn data_length(&self) -> usize {
        self.read_font_data().len()
    }

    /// Copy the data to `writer`, returning the number of bytes written.
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<usize>
    where
        Self: Sized,
    {
        self.read_font_data().copy_to_writer(writer)
    }

    fn serialize_to<C: WriteContext>(&self, ctxt: &mut C) -> Result<usize, WriteError>
    where
        Self: Sized,
    {
        self.read_font_data().copy_to(ctxt)
    }
}

/// The raw bytes held by a builder.
#[derive(Debug)]
pub enum BackingData {
    Mutable(WritableFontData),
    Immutable(ReadableFontData),
}

impl BackingData {
    pub fn scope(&self) -> ReadScope<'_> {
        match self {
            BackingData::Mutable(data) => data.scope(),
            BackingData::Immutable(data) => data.scope(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BackingData::Mutable(data) => data.len(),
            BackingData::Immutable(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_readable(self) -> ReadableFontData {
        match self {
            BackingData::Mutable(data) => data.into_readable(),
            BackingData::Immutable(data) => data,
        }
    }

    fn snapshot(&self) -> ReadableFontData {
        match self {
            BackingData::Mutable(data) => ReadableFontData::from(data.bytes()),
            BackingData::Immutable(data) => ReadableFontData::from(data.bytes()),
        }
    }
}

/// Shared "a child changed" flag.
///
/// A container hands a clone of its flag to each child builder it creates. When a child's model
/// or data changes the child sets the flag, so the container learns it must re-serialize without
/// inspecting its children.
#[derive(Clone, Default)]
pub struct ChangeFlag(Rc<Cell<bool>>);

impl ChangeFlag {
    pub fn new() -> Self {
        ChangeFlag::default()
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, changed: bool) {
        self.0.set(changed)
    }
}

impl fmt::Debug for ChangeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChangeFlag").field(&self.get()).finish()
    }
}

/// Format specific behaviour plugged into `FontDataTableBuilder`.
pub trait BuilderHooks {
    /// The read-only value produced by `build`.
    type Built;

    /// Write the model to `new_data`, returning the number of bytes written.
    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError>;

    /// Whether the model is complete enough to serialize.
    fn sub_ready_to_serialize(&self) -> bool;

    fn sub_data_size_to_serialize(&self) -> SerializeSize;

    /// New raw data was set on the builder. Any decoded model is stale.
    fn sub_data_set(&mut self);

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<Self::Built, ParseError>;

    /// Called on the freshly built value. `changed` is whether the builder had any edits.
    fn notify_post_table_build(&mut self, _built: &mut Self::Built, _changed: bool) {}

    /// Tag reported when the model is not ready to serialize, or 0 for a subtable.
    fn error_tag(&self) -> u32 {
        0
    }
}

/// Orchestrates a builder's raw data, its model and their dirtiness.
pub struct FontDataTableBuilder<M: BuilderHooks> {
    hooks: M,
    data: Option<BackingData>,
    model_changed: bool,
    data_changed: bool,
    contained_model_changed: ChangeFlag,
    parent: Option<ChangeFlag>,
}

impl<M: BuilderHooks> FontDataTableBuilder<M> {
    /// A builder with no data. Its model must be populated before it has anything to build.
    pub fn new(hooks: M) -> Self {
        FontDataTableBuilder {
            hooks,
            data: None,
            model_changed: false,
            data_changed: false,
            contained_model_changed: ChangeFlag::new(),
            parent: None,
        }
    }

    pub fn from_data(data: ReadableFontData, hooks: M) -> Self {
        let mut builder = FontDataTableBuilder::new(hooks);
        builder.data = Some(BackingData::Immutable(data));
        builder
    }

    pub fn from_writable(data: WritableFontData, hooks: M) -> Self {
        let mut builder = FontDataTableBuilder::new(hooks);
        builder.data = Some(BackingData::Mutable(data));
        builder
    }

    /// A builder with a fresh buffer allocated per `size`.
    pub fn with_size(size: SerializeSize, hooks: M) -> Self {
        FontDataTableBuilder::from_writable(WritableFontData::create(size), hooks)
    }

    /// Attach this builder to the container owning `parent`.
    pub fn with_parent(mut self, parent: ChangeFlag) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hooks(&self) -> &M {
        &self.hooks
    }

    /// Mutable access to the hooks. This does not mark the model changed.
    pub fn hooks_mut(&mut self) -> &mut M {
        &mut self.hooks
    }

    /// Disjoint access to the hooks and a read view of the raw data, for lazy decoding.
    pub fn split_mut(&mut self) -> (&mut M, ReadScope<'_>) {
        let scope = match &self.data {
            Some(data) => data.scope(),
            None => ReadScope::new(&[]),
        };
        (&mut self.hooks, scope)
    }

    /// A new independent snapshot of the builder's current bytes.
    ///
    /// If the model has changed it is serialized, which fails if it is not ready.
    pub fn data(&self) -> Result<ReadableFontData, WriteError> {
        if self.model_changed() {
            self.serialize_model()
        } else {
            Ok(self
                .data
                .as_ref()
                .map(BackingData::snapshot)
                .unwrap_or_default())
        }
    }

    /// Consume the builder and produce its read-only value.
    ///
    /// Returns `Ok(None)` when there is no data and the model hasn't been touched.
    pub fn build(mut self) -> Result<Option<M::Built>, ReadWriteError> {
        let changed = self.changed();
        let data = if self.model_changed() {
            Some(self.serialize_model()?)
        } else {
            self.data.take().map(BackingData::into_readable)
        };

        match data {
            Some(data) => {
                let mut built = self.hooks.sub_build_table(data)?;
                self.hooks.notify_post_table_build(&mut built, changed);
                Ok(Some(built))
            }
            None => Ok(None),
        }
    }

    fn serialize_model(&self) -> Result<ReadableFontData, WriteError> {
        if !self.hooks.sub_ready_to_serialize() {
            return Err(WriteError::NotReadyToSerialize(self.hooks.error_tag()));
        }
        let mut new_data = WritableFontData::create(self.hooks.sub_data_size_to_serialize());
        let written = self.hooks.sub_serialize(&mut new_data)?;
        trace!("serialized model into {} bytes", written);
        Ok(new_data.into_readable())
    }

    /// Whether `data` or `build` would succeed. Unchanged raw data is always ready.
    pub fn ready_to_serialize(&self) -> bool {
        !self.model_changed() || self.hooks.sub_ready_to_serialize()
    }

    /// The space this builder takes when serialized into a container.
    pub fn data_size_to_serialize(&self) -> SerializeSize {
        if self.model_changed() {
            self.hooks.sub_data_size_to_serialize()
        } else {
            SerializeSize::Fixed(self.data.as_ref().map_or(0, BackingData::len))
        }
    }

    /// Serialize into a container's buffer at its current position.
    pub fn serialize_into(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        if self.model_changed() {
            if !self.hooks.sub_ready_to_serialize() {
                return Err(WriteError::NotReadyToSerialize(self.hooks.error_tag()));
            }
            self.hooks.sub_serialize(new_data)
        } else {
            let scope = self.internal_read_data().unwrap_or_else(|| ReadScope::new(&[]));
            new_data.write_bytes(scope.data())?;
            Ok(scope.data().len())
        }
    }

    pub fn changed(&self) -> bool {
        self.data_changed() || self.model_changed()
    }

    pub fn data_changed(&self) -> bool {
        self.data_changed
    }

    pub fn model_changed(&self) -> bool {
        self.current_model_changed() || self.contained_model_changed()
    }

    pub fn current_model_changed(&self) -> bool {
        self.model_changed
    }

    pub fn contained_model_changed(&self) -> bool {
        self.contained_model_changed.get()
    }

    pub fn set_model_changed(&mut self, changed: bool) {
        self.model_changed = changed;
        if changed {
            self.notify_parent();
        }
    }

    /// The flag child builders use to mark this builder changed.
    pub fn change_flag(&self) -> ChangeFlag {
        self.contained_model_changed.clone()
    }

    pub fn set_data(&mut self, data: ReadableFontData) {
        self.replace_data(BackingData::Immutable(data));
    }

    pub fn set_writable_data(&mut self, data: WritableFontData) {
        self.replace_data(BackingData::Mutable(data));
    }

    fn replace_data(&mut self, data: BackingData) {
        self.data = Some(data);
        self.data_changed = true;
        self.notify_parent();
        self.hooks.sub_data_set();
    }

    fn notify_parent(&self) {
        if let Some(parent) = &self.parent {
            parent.set(true);
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Read view of whichever representation the builder holds.
    pub fn internal_read_data(&self) -> Option<ReadScope<'_>> {
        self.data.as_ref().map(BackingData::scope)
    }

    /// The raw bytes as a writable buffer, copying them out of an immutable view first.
    ///
    /// Writing through this buffer is a raw edit and does not mark the model changed.
    pub fn internal_write_data(&mut self) -> &mut WritableFontData {
        let data = match self.data.take() {
            Some(BackingData::Mutable(data)) => data,
            Some(BackingData::Immutable(data)) => data.to_writable(),
            None => WritableFontData::growable(0),
        };
        let backing = self.data.insert(BackingData::Mutable(data));
        match backing {
            BackingData::Mutable(data) => data,
            BackingData::Immutable(_) => unreachable!("data was just made mutable"),
        }
    }
}

impl<M: BuilderHooks + fmt::Debug> fmt::Debug for FontDataTableBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontDataTableBuilder")
            .field("hooks", &self.hooks)
            .field("data", &self.data)
            .field("model_changed", &self.model_changed)
            .field("data_changed", &self.data_changed)
            .field("contained_model_changed", &self.contained_model_changed)
            .finish()
    }
}
