//! Construct-by-name: the class registry, deferred factories and constructed instances.
//!
//! A [`Registry`] maps class identifiers such as `models.Encoder` to constructors. The
//! embedding program fills it at startup, either with serde-deserializable types
//! ([`Registry::register`]) or with closures over [`Args`] ([`Registry::register_fn`]).
//!
//! A [`Factory`] is resolved against the registry once and then invoked any number of
//! times. Every invocation runs the constructor again, so two calls never return the
//! same [`Instance`].
//!
//! Classes registered with [`Registry::register_generator`] build a [`Generator`]
//! instead, and construction expands it into a sequence of its items.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use serde::de::DeserializeOwned;

use crate::de::from_node;
use crate::error::Error;
use crate::node::{Mapping, Node, NodeKind};

/// Anything a constructor may produce.
pub trait Constructed: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any + fmt::Debug> Constructed for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A constructed value together with the class it was built from.
///
/// Cloning an `Instance` shares the value; use [`Instance::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct Instance {
    class: Rc<str>,
    value: Rc<dyn Constructed>,
}

impl Instance {
    pub fn new<T: Any + fmt::Debug>(class: &str, value: T) -> Self {
        Self {
            class: Rc::from(class),
            value: Rc::new(value),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        Constructed::as_any(&*self.value).downcast_ref::<T>()
    }

    /// Shares the value as `Rc<T>`. Useful when one object is wired into another.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        Constructed::into_any(Rc::clone(&self.value)).downcast::<T>().ok()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// True when both handles point at the same constructed value.
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Rc::ptr_eq(&a.value, &b.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.value)
    }
}

/// Constructor arguments, classified by shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Args {
    #[default]
    Empty,
    Positional(Vec<Node>),
    Keyword(Mapping),
    Single(Box<Node>),
}

impl Args {
    /// Classifies an `args` node. Absent and falsy values (null, `false`, `0`, `""`,
    /// empty containers) mean no arguments.
    pub fn from_node(node: Option<Node>) -> Self {
        match node {
            None => Args::Empty,
            Some(node) if !node.is_truthy() => Args::Empty,
            Some(Node::Sequence(items)) => Args::Positional(items),
            Some(Node::Mapping(map)) => Args::Keyword(map),
            Some(other) => Args::Single(Box::new(other)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Args::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            Args::Empty => 0,
            Args::Positional(items) => items.len(),
            Args::Keyword(map) => map.len(),
            Args::Single(_) => 1,
        }
    }

    /// Shape name used in merge errors; `None` for empty arguments.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Args::Empty => None,
            Args::Positional(_) => Some(NodeKind::Sequence),
            Args::Keyword(_) => Some(NodeKind::Mapping),
            Args::Single(node) => Some(node.kind()),
        }
    }

    /// Binds a parameter the way a call would: by `name` for keyword arguments,
    /// by `position` otherwise. A single argument sits at position 0.
    pub fn get(&self, name: &str, position: usize) -> Option<&Node> {
        match self {
            Args::Empty => None,
            Args::Positional(items) => items.get(position),
            Args::Keyword(map) => map.get(name),
            Args::Single(node) => (position == 0).then_some(&**node),
        }
    }

    /// Like [`Args::get`], failing with a construction error when the argument is missing.
    pub fn require(&self, name: &str, position: usize) -> Result<&Node, Error> {
        self.get(name, position).ok_or_else(|| {
            Error::construction_msg(format!("missing argument `{name}` (position {position})"))
        })
    }

    /// Rebuilds the argument node: null, sequence, mapping or the single value.
    pub fn to_node(&self) -> Node {
        match self {
            Args::Empty => Node::NULL,
            Args::Positional(items) => Node::Sequence(items.clone()),
            Args::Keyword(map) => Node::Mapping(map.clone()),
            Args::Single(node) => (**node).clone(),
        }
    }

    /// Deserializes the whole argument set into `T`.
    ///
    /// Keyword arguments fill fields by name, positional arguments fill them in
    /// declaration order, and a single argument fills the first field.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        from_node(&self.to_node())
    }

    /// Merges `supplied` into `self`. Keyword sets merge with `supplied` winning on
    /// collisions; an empty side adopts the other. Any other pairing is rejected and
    /// leaves `self` untouched.
    pub(crate) fn merge(&mut self, supplied: Args) -> Result<(), (NodeKind, NodeKind)> {
        if supplied.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = supplied;
            return Ok(());
        }
        match (self, supplied) {
            (Args::Keyword(held), Args::Keyword(extra)) => {
                held.extend(extra);
                Ok(())
            }
            (held, supplied) => Err((
                held.kind().unwrap_or(NodeKind::Scalar),
                supplied.kind().unwrap_or(NodeKind::Scalar),
            )),
        }
    }
}

/// A constructed value that stands for a sequence: construction yields
/// `process(0)`, ..., `process(times() - 1)` in place of the generator itself.
pub trait Generator: fmt::Debug {
    fn times(&self) -> usize;
    fn process(&self, index: usize) -> Result<Node, Error>;
}

/// The plain generator: `data`, repeated `times` times (once when `times` is absent).
///
/// ```rust
/// use saphyr_wire::{construct, from_str, Node, Registry, Repeat};
///
/// let mut registry = Registry::new();
/// registry.register_generator("gen.Repeat", Repeat::from_args);
///
/// let spec = from_str("{class: gen.Repeat, args: {data: 0.5, times: 3}}").unwrap();
/// let rates = construct(&registry, &spec).unwrap();
/// assert_eq!(rates.to_string(), "[0.5, 0.5, 0.5]");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Repeat {
    pub data: Node,
    pub times: usize,
}

impl Repeat {
    /// Reads `data` (position 0) and `times` (position 1).
    pub fn from_args(args: &Args) -> Result<Self, Error> {
        let data = args.require("data", 0)?.clone();
        let times = match args.get("times", 1) {
            None => 1,
            Some(node) => node
                .as_i64()
                .and_then(|times| usize::try_from(times).ok())
                .ok_or_else(|| {
                    Error::construction_msg(format!("`times` must be a non-negative integer, got {node}"))
                })?,
        };
        Ok(Self { data, times })
    }
}

impl Generator for Repeat {
    fn times(&self) -> usize {
        self.times
    }

    fn process(&self, _index: usize) -> Result<Node, Error> {
        Ok(self.data.clone())
    }
}

/// What a registered constructor hands back.
enum Product {
    Value(Rc<dyn Constructed>),
    Items(Vec<Node>),
}

type ConstructFn = dyn Fn(&Args) -> Result<Product, Error>;

/// Class identifier to constructor table.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: AHashMap<String, Rc<ConstructFn>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `class`, built by deserializing its arguments.
    ///
    /// ```rust
    /// use serde::Deserialize;
    /// use saphyr_wire::{Args, Factory, Node, Registry};
    ///
    /// #[derive(Debug, Deserialize, PartialEq)]
    /// struct Point { x: i64, y: i64 }
    ///
    /// let mut registry = Registry::new();
    /// registry.register::<Point>("geometry.Point");
    ///
    /// let args: Node = [("x", 1), ("y", 2)].into_iter().collect();
    /// let factory = Factory::new(&registry, "geometry.Point", Args::from_node(Some(args))).unwrap();
    /// let point = factory.build().unwrap();
    /// assert_eq!(point.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
    /// ```
    pub fn register<T>(&mut self, class: impl Into<String>) -> &mut Self
    where
        T: DeserializeOwned + fmt::Debug + 'static,
    {
        self.register_fn(class, |args: &Args| args.deserialize::<T>())
    }

    /// Registers a constructor closure under `class`. Use this when arguments include
    /// other constructed objects, which have no serde form.
    pub fn register_fn<T, F>(&mut self, class: impl Into<String>, constructor: F) -> &mut Self
    where
        T: Any + fmt::Debug,
        F: Fn(&Args) -> Result<T, Error> + 'static,
    {
        let constructor: Rc<ConstructFn> = Rc::new(move |args: &Args| {
            constructor(args).map(|v| Product::Value(Rc::new(v) as Rc<dyn Constructed>))
        });
        self.constructors.insert(class.into(), constructor);
        self
    }

    /// Registers a [`Generator`] under `class`. Constructing the class yields the
    /// generator's items as a sequence.
    pub fn register_generator<G, F>(&mut self, class: impl Into<String>, generator: F) -> &mut Self
    where
        G: Generator,
        F: Fn(&Args) -> Result<G, Error> + 'static,
    {
        let constructor: Rc<ConstructFn> = Rc::new(move |args: &Args| {
            let generator = generator(args)?;
            let items = (0..generator.times())
                .map(|index| generator.process(index))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Product::Items(items))
        });
        self.constructors.insert(class.into(), constructor);
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    fn resolve(&self, class: &str) -> Result<Rc<ConstructFn>, Error> {
        self.constructors
            .get(class)
            .cloned()
            .ok_or_else(|| Error::resolution(class))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&str> = self.classes().collect();
        classes.sort_unstable();
        f.debug_struct("Registry").field("classes", &classes).finish()
    }
}

/// A resolved class plus held arguments. Each call constructs a new instance.
#[derive(Clone)]
pub struct Factory {
    class: Rc<str>,
    constructor: Rc<ConstructFn>,
    args: Args,
}

impl Factory {
    /// Resolves `class` now; an unknown class fails here rather than on first call.
    pub fn new(registry: &Registry, class: &str, args: Args) -> Result<Self, Error> {
        Ok(Self {
            class: Rc::from(class),
            constructor: registry.resolve(class)?,
            args,
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    fn run(&self) -> Result<Product, Error> {
        tracing::trace!(class = %self.class, args = self.args.len(), "constructing instance");
        (self.constructor)(&self.args).map_err(|err| err.in_class(&self.class))
    }

    /// Constructs with the held arguments. Generator classes fail here; use
    /// [`Factory::produce`] for them.
    pub fn build(&self) -> Result<Instance, Error> {
        match self.run()? {
            Product::Value(value) => Ok(Instance {
                class: Rc::clone(&self.class),
                value,
            }),
            Product::Items(_) => Err(Error::construction_msg(
                "generator classes build a sequence, not one instance",
            )
            .in_class(&self.class)),
        }
    }

    /// Constructs with the held arguments: the instance as an object node, or the
    /// expanded items of a generator as a sequence.
    pub fn produce(&self) -> Result<Node, Error> {
        match self.run()? {
            Product::Value(value) => Ok(Node::Object(Built::Instance(Instance {
                class: Rc::clone(&self.class),
                value,
            }))),
            Product::Items(items) => {
                tracing::trace!(class = %self.class, items = items.len(), "generator expanded");
                Ok(Node::Sequence(items))
            }
        }
    }

    /// Merges `extra` into the held arguments (the merge persists for later calls),
    /// then constructs.
    pub fn call(&mut self, extra: Args) -> Result<Instance, Error> {
        self.args
            .merge(extra)
            .map_err(|(held, supplied)| Error::ArgumentMerge {
                class: self.class.to_string(),
                held,
                supplied,
                path: String::new(),
            })?;
        self.build()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("class", &self.class)
            .field("args", &self.args)
            .finish()
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.args == other.args
    }
}

/// What a construction spec turns into: a live value or a factory for it.
#[derive(Clone, Debug)]
pub enum Built {
    Instance(Instance),
    Factory(Factory),
}

impl Built {
    pub fn class(&self) -> &str {
        match self {
            Built::Instance(instance) => instance.class(),
            Built::Factory(factory) => factory.class(),
        }
    }
}

impl PartialEq for Built {
    /// Instances compare by identity, factories by class and held arguments.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Built::Instance(a), Built::Instance(b)) => Instance::ptr_eq(a, b),
            (Built::Factory(a), Built::Factory(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Built {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Built::Instance(instance) => write!(f, "{instance}"),
            Built::Factory(factory) => write!(f, "<factory {}>", factory.class),
        }
    }
}
