//! Class descriptors: the per-type schema of user objects.
//!
//! A [`ClassDef`] is built once through [`ClassBuilder`] and shared behind an
//! `Arc`. Building computes the method resolution order and the full slot
//! schema across the ancestry, so attribute introspection never walks the
//! class hierarchy per object.
//!
//! Classes opt into capabilities through hooks:
//!
//! | hook | capability |
//! |---|---|
//! | `params` | get configuration parameters (preferred serialization path) |
//! | `constructor` | build an instance from keyword parameters |
//! | `get_state` / `set_state` | explicit state capture and restore |
//! | `from_items` | rebuild a container-like instance from its items |
//!
//! Hooks not set on a class are inherited from the first base that sets them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::heap::Heap;
use crate::ident::{check_dotted_path, check_identifier};
use crate::types::TypeKey;
use crate::value::{EnumMember, NodeId, Value};

/// Ordered name → value pairs (parameters, state, keyword arguments).
pub type Fields = Vec<(String, Value)>;

/// Reads an instance's configuration parameters.
pub type ParamsHook = Arc<dyn Fn(&Heap, NodeId) -> anyhow::Result<Fields> + Send + Sync>;
/// Builds an instance from keyword parameters.
pub type ConstructHook = Arc<dyn Fn(&mut Heap, Fields) -> anyhow::Result<Value> + Send + Sync>;
/// Captures an instance's state.
pub type GetStateHook = Arc<dyn Fn(&Heap, NodeId) -> anyhow::Result<Fields> + Send + Sync>;
/// Restores state into a bare instance.
pub type SetStateHook = Arc<dyn Fn(&mut Heap, NodeId, Fields) -> anyhow::Result<()> + Send + Sync>;
/// Builds a container-like instance from its items.
pub type FromItemsHook = Arc<dyn Fn(&mut Heap, Vec<Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Capability hooks of a class.
#[derive(Clone, Default)]
pub struct ClassHooks {
    /// Get configuration parameters
    pub params: Option<ParamsHook>,
    /// Keyword constructor
    pub construct: Option<ConstructHook>,
    /// Explicit state capture
    pub get_state: Option<GetStateHook>,
    /// Explicit state restore
    pub set_state: Option<SetStateHook>,
    /// Container constructor from items
    pub from_items: Option<FromItemsHook>,
}

impl ClassHooks {
    fn inherit(&mut self, base: &ClassHooks) {
        if self.params.is_none() {
            self.params = base.params.clone();
        }
        if self.construct.is_none() {
            self.construct = base.construct.clone();
        }
        if self.get_state.is_none() {
            self.get_state = base.get_state.clone();
        }
        if self.set_state.is_none() {
            self.set_state = base.set_state.clone();
        }
        if self.from_items.is_none() {
            self.from_items = base.from_items.clone();
        }
    }
}

impl fmt::Debug for ClassHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHooks")
            .field("params", &self.params.is_some())
            .field("construct", &self.construct.is_some())
            .field("get_state", &self.get_state.is_some())
            .field("set_state", &self.set_state.is_some())
            .field("from_items", &self.from_items.is_some())
            .finish()
    }
}

/// How a sequence-like class behaves when it has to be rebuilt generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceFlavor {
    /// Ordered, mutable
    List,
    /// Ordered, immutable
    Tuple,
    /// Unordered
    Set,
}

/// Item storage a class declares in addition to its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerProtocol {
    /// Instances iterate over a sequence of items
    Sequence(SequenceFlavor),
    /// Instances map keys to values
    Mapping,
}

/// Slot names that never hold instance data.
const SPECIAL_SLOTS: [&str; 2] = ["__dict__", "__weakref__"];

/// Descriptor of a user class.
pub struct ClassDef {
    key: TypeKey,
    bases: Vec<Arc<ClassDef>>,
    own_slots: Vec<String>,
    declares_slots: bool,
    has_dict: bool,
    dataclass_fields: Option<Vec<String>>,
    computed: Vec<String>,
    container: Option<ContainerProtocol>,
    enum_members: Option<Vec<String>>,
    default_params: Fields,
    auxiliary_params: Vec<String>,
    hooks: ClassHooks,
    keyword_init: bool,
    mro: Vec<TypeKey>,
    slots: Vec<String>,
}

impl ClassDef {
    /// Create a new builder for configuring a class
    #[must_use]
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(module, name)
    }

    /// Shorthand for an enumeration class with the given members.
    pub fn enumeration<I, S>(
        module: impl Into<String>,
        name: impl Into<String>,
        members: I,
    ) -> Result<Arc<ClassDef>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(module, name).enum_members(members).build()
    }

    /// Type key (`module:name`).
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Defining module.
    pub fn module(&self) -> &str {
        self.key.module()
    }

    /// Qualified name.
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Direct bases.
    pub fn bases(&self) -> &[Arc<ClassDef>] {
        &self.bases
    }

    /// This class followed by its ancestors, each once, depth-first.
    pub fn mro(&self) -> &[TypeKey] {
        &self.mro
    }

    /// Whether `key` names this class or one of its ancestors.
    pub fn is_subclass_of(&self, key: &TypeKey) -> bool {
        self.mro.iter().any(|k| k == key)
    }

    /// Slots declared by this class alone.
    pub fn own_slots(&self) -> &[String] {
        &self.own_slots
    }

    /// Every slot across the ancestry, parent-to-child, without duplicates.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Position of a slot in [`ClassDef::slots`].
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s == name)
    }

    /// Whether this class or an ancestor declares a fixed slot layout.
    pub fn declares_slots(&self) -> bool {
        self.declares_slots
    }

    /// Whether instances carry a dynamic field mapping.
    pub fn has_dict(&self) -> bool {
        self.has_dict
    }

    /// Dataclass field names, in declaration order.
    pub fn dataclass_fields(&self) -> Option<&[String]> {
        self.dataclass_fields.as_deref()
    }

    /// Whether the class has dataclass semantics.
    pub fn is_dataclass(&self) -> bool {
        self.dataclass_fields.is_some()
    }

    /// Class-level computed attribute names; never read by introspection.
    pub fn computed(&self) -> &[String] {
        &self.computed
    }

    /// Declared container protocol.
    pub fn container(&self) -> Option<ContainerProtocol> {
        self.container
    }

    /// Enumeration members, for enumeration classes.
    pub fn enum_members(&self) -> Option<&[String]> {
        self.enum_members.as_deref()
    }

    /// Whether this is an enumeration class.
    pub fn is_enum(&self) -> bool {
        self.enum_members.is_some()
    }

    /// Default constructor parameters, sorted by name.
    pub fn default_params(&self) -> &Fields {
        &self.default_params
    }

    /// Parameter names that do not define the object's identity.
    pub fn auxiliary_params(&self) -> &[String] {
        &self.auxiliary_params
    }

    /// Capability hooks (own or inherited).
    pub fn hooks(&self) -> &ClassHooks {
        &self.hooks
    }

    /// Whether [`ClassDef::construct`] can build instances.
    pub fn has_constructor(&self) -> bool {
        self.hooks.construct.is_some() || self.keyword_init
    }

    /// Whether instances expose configuration parameters.
    pub fn is_parameterizable(&self) -> bool {
        self.hooks.params.is_some()
    }

    /// Look up an enumeration member.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::WrongKind` if this is not an enumeration and
    /// `ModelError::UnknownEnumMember` if the member does not exist.
    pub fn member(self: &Arc<Self>, name: &str) -> Result<Value> {
        let members = self
            .enum_members
            .as_ref()
            .ok_or_else(|| ModelError::wrong_kind("enumeration class", self.name()))?;
        if members.iter().any(|m| m == name) {
            Ok(Value::Enum(EnumMember::new(Arc::clone(self), name.to_string())))
        } else {
            Err(ModelError::UnknownEnumMember {
                class: self.name().to_string(),
                member: name.to_string(),
            })
        }
    }

    /// Call the keyword constructor.
    ///
    /// A `constructor` hook wins; otherwise a class built with
    /// [`ClassBuilder::keyword_init`] gets a fresh instance with the default
    /// parameters and then `kwargs` assigned as attributes.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidClass` if the class has no constructor,
    /// `ModelError::Hook` if the constructor hook fails, and attribute errors
    /// when a keyword does not fit the slot layout.
    pub fn construct(self: &Arc<Self>, heap: &mut Heap, kwargs: Fields) -> Result<Value> {
        if let Some(construct) = &self.hooks.construct {
            return construct(heap, kwargs)
                .map_err(|e| ModelError::hook(format!("constructor of {}", self.key), e));
        }
        if !self.keyword_init {
            return Err(ModelError::invalid_class(self.key.tag(), "no keyword constructor"));
        }
        let mut fields = self.default_params.clone();
        for (name, value) in kwargs {
            match fields.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name, value)),
            }
        }
        heap.object(self, fields)
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("key", &self.key)
            .field("mro", &self.mro)
            .field("slots", &self.slots)
            .field("has_dict", &self.has_dict)
            .field("dataclass_fields", &self.dataclass_fields)
            .field("container", &self.container)
            .field("enum_members", &self.enum_members)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a [`ClassDef`]
pub struct ClassBuilder {
    module: String,
    name: String,
    bases: Vec<Arc<ClassDef>>,
    slots: Option<Vec<String>>,
    dict: Option<bool>,
    dataclass_fields: Option<Vec<String>>,
    computed: Vec<String>,
    container: Option<ContainerProtocol>,
    enum_members: Option<Vec<String>>,
    default_params: Fields,
    auxiliary_params: Vec<String>,
    hooks: ClassHooks,
    keyword_init: bool,
}

impl ClassBuilder {
    fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            bases: Vec::new(),
            slots: None,
            dict: None,
            dataclass_fields: None,
            computed: Vec::new(),
            container: None,
            enum_members: None,
            default_params: Vec::new(),
            auxiliary_params: Vec::new(),
            hooks: ClassHooks::default(),
            keyword_init: false,
        }
    }

    /// Add a direct base class
    #[must_use]
    pub fn base(mut self, base: &Arc<ClassDef>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Declare a fixed slot layout (instances get no dynamic mapping unless
    /// [`ClassBuilder::with_dict`] is also called)
    #[must_use]
    pub fn slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slots
            .get_or_insert_with(Vec::new)
            .extend(slots.into_iter().map(Into::into));
        self
    }

    /// Give instances a dynamic field mapping even when slots are declared
    #[must_use]
    pub fn with_dict(mut self) -> Self {
        self.dict = Some(true);
        self
    }

    /// Give instances no dynamic field mapping
    #[must_use]
    pub fn without_dict(mut self) -> Self {
        self.dict = Some(false);
        self
    }

    /// Dataclass semantics over the given fields
    #[must_use]
    pub fn dataclass<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dataclass_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare class-level computed attributes
    #[must_use]
    pub fn computed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.computed.extend(names.into_iter().map(Into::into));
        self
    }

    /// Instances iterate over items
    #[must_use]
    pub fn sequence(mut self, flavor: SequenceFlavor) -> Self {
        self.container = Some(ContainerProtocol::Sequence(flavor));
        self
    }

    /// Instances map keys to values
    #[must_use]
    pub fn mapping(mut self) -> Self {
        self.container = Some(ContainerProtocol::Mapping);
        self
    }

    /// Make this an enumeration class
    #[must_use]
    pub fn enum_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_members = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a default constructor parameter
    #[must_use]
    pub fn default_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_params.push((name.into(), value.into()));
        self
    }

    /// Mark parameters as auxiliary (not part of the object's identity)
    #[must_use]
    pub fn auxiliary_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auxiliary_params.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the configuration-parameters hook
    #[must_use]
    pub fn params<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Heap, NodeId) -> anyhow::Result<Fields> + Send + Sync + 'static,
    {
        self.hooks.params = Some(Arc::new(hook));
        self
    }

    /// Set the keyword constructor
    #[must_use]
    pub fn constructor<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Heap, Fields) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.hooks.construct = Some(Arc::new(hook));
        self
    }

    /// Construct instances by assigning keyword parameters as attributes
    #[must_use]
    pub fn keyword_init(mut self) -> Self {
        self.keyword_init = true;
        self
    }

    /// Set the state capture hook
    #[must_use]
    pub fn get_state<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Heap, NodeId) -> anyhow::Result<Fields> + Send + Sync + 'static,
    {
        self.hooks.get_state = Some(Arc::new(hook));
        self
    }

    /// Set the state restore hook
    #[must_use]
    pub fn set_state<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Heap, NodeId, Fields) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.set_state = Some(Arc::new(hook));
        self
    }

    /// Set the container constructor
    #[must_use]
    pub fn from_items<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Heap, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.hooks.from_items = Some(Arc::new(hook));
        self
    }

    /// Build the descriptor
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidIdentifier` for malformed names and
    /// `ModelError::InvalidClass` for contradictory declarations (duplicate
    /// slots, enumeration classes with storage, unknown auxiliary parameters).
    pub fn build(self) -> Result<Arc<ClassDef>> {
        check_dotted_path(&self.module)?;
        check_dotted_path(&self.name)?;
        let key = TypeKey::new(self.module, self.name);

        let own_slots = self.slots.clone().unwrap_or_default();
        let mut seen_own = HashSet::new();
        for slot in &own_slots {
            if !SPECIAL_SLOTS.contains(&slot.as_str()) {
                check_identifier(slot)?;
            }
            if !seen_own.insert(slot.as_str()) {
                return Err(ModelError::invalid_class(key.tag(), format!("duplicate slot '{slot}'")));
            }
        }
        for (name, _) in &self.default_params {
            check_identifier(name)?;
        }
        for name in &self.auxiliary_params {
            check_identifier(name)?;
        }

        if self.enum_members.is_some() && (self.slots.is_some() || self.container.is_some()) {
            return Err(ModelError::invalid_class(
                key.tag(),
                "enumeration classes cannot declare slots or items",
            ));
        }
        if let Some(members) = &self.enum_members {
            for member in members {
                check_identifier(member)?;
            }
        }

        let mut mro = vec![key.clone()];
        for base in &self.bases {
            for ancestor in base.mro() {
                if !mro.contains(ancestor) {
                    mro.push(ancestor.clone());
                }
            }
        }

        // Parent-to-child slot order.
        let mut slots: Vec<String> = Vec::new();
        for base in &self.bases {
            for slot in base.slots() {
                if !slots.contains(slot) {
                    slots.push(slot.clone());
                }
            }
        }
        for slot in &own_slots {
            if !SPECIAL_SLOTS.contains(&slot.as_str()) && !slots.contains(slot) {
                slots.push(slot.clone());
            }
        }

        let own_declares_slots = self.slots.is_some();
        let own_dict = self.dict.unwrap_or(!own_declares_slots)
            || own_slots.iter().any(|s| s == "__dict__");
        let has_dict = self.enum_members.is_none()
            && (own_dict || self.bases.iter().any(|b| b.has_dict()));
        let declares_slots = own_declares_slots || self.bases.iter().any(|b| b.declares_slots());

        let mut hooks = self.hooks;
        let mut container = self.container;
        let mut dataclass_fields = self.dataclass_fields;
        let mut computed = self.computed;
        for base in &self.bases {
            hooks.inherit(base.hooks());
            if container.is_none() {
                container = base.container();
            }
            if dataclass_fields.is_none() {
                dataclass_fields = base.dataclass_fields().map(<[String]>::to_vec);
            }
            for name in base.computed() {
                if !computed.contains(name) {
                    computed.push(name.clone());
                }
            }
        }

        let keyword_init = self.keyword_init || self.bases.iter().any(|b| b.keyword_init);

        let mut default_params = self.default_params;
        default_params.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Arc::new(ClassDef {
            key,
            bases: self.bases,
            own_slots,
            declares_slots,
            has_dict,
            dataclass_fields,
            computed,
            container,
            enum_members: self.enum_members,
            default_params,
            auxiliary_params: self.auxiliary_params,
            hooks,
            keyword_init,
            mro,
            slots,
        }))
    }
}
