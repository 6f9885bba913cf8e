//! Class zoo shared by the integration tests

use std::sync::{Arc, OnceLock, Weak};

use chrono::NaiveDate;
use mixforge::prelude::*;

/// Late-bound handle a hook uses to reach its own class.
type SelfRef = Arc<OnceLock<Weak<ClassDef>>>;

fn upgrade(cell: &OnceLock<Weak<ClassDef>>) -> anyhow::Result<Arc<ClassDef>> {
    cell.get()
        .and_then(Weak::upgrade)
        .ok_or_else(|| anyhow::anyhow!("class descriptor was dropped"))
}

/// One class per serialization and reconstruction path.
#[derive(Debug, Clone)]
pub struct Fixtures {
    /// `geometry:Point`, slots `x` and `y`
    pub point: Arc<ClassDef>,
    /// `ml:Forest`, parameterizable with defaults and an auxiliary `verbose`
    pub forest: Arc<ClassDef>,
    /// `palette:Color`, an enumeration
    pub color: Arc<ClassDef>,
    /// `app:Wrapper`, a single `inner` slot
    pub wrapper: Arc<ClassDef>,
    /// `app:Record`, plain field mapping
    pub record: Arc<ClassDef>,
    /// `app:Counter`, explicit state capture and restore
    pub counter: Arc<ClassDef>,
    /// `app:Interval`, a dataclass over `low` and `high`
    pub interval: Arc<ClassDef>,
    /// `app:Catalog`, a mapping object with a `title`
    pub catalog: Arc<ClassDef>,
    /// `app:Stack`, a list-like object that rebuilds itself from items
    pub stack: Arc<ClassDef>,
    /// `app:Bag`, a tuple-like object without an items constructor
    pub bag: Arc<ClassDef>,
}

impl Fixtures {
    /// Build every fixture class.
    pub fn new() -> Result<Self> {
        let point = ClassDef::builder("geometry", "Point").slots(["x", "y"]).build()?;

        let forest = ClassDef::builder("ml", "Forest")
            .default_param("n_trees", 100)
            .default_param("depth", 3)
            .default_param("verbose", false)
            .auxiliary_params(["verbose"])
            .params(|heap, id| {
                let mut params = Fields::new();
                for name in ["n_trees", "depth", "verbose"] {
                    params.push((name.to_string(), heap.get_attr(id, name)?));
                }
                Ok(params)
            })
            .keyword_init()
            .build()?;

        let color = ClassDef::enumeration("palette", "Color", ["Red", "Green", "Blue"])?;
        let wrapper = ClassDef::builder("app", "Wrapper").slots(["inner"]).build()?;
        let record = ClassDef::builder("app", "Record").build()?;

        let counter = ClassDef::builder("app", "Counter")
            .get_state(|heap, id| Ok(vec![("count".to_string(), heap.get_attr(id, "count")?)]))
            .set_state(|heap, id, state| {
                for (name, value) in state {
                    heap.set_attr(id, &name, value)?;
                }
                heap.set_attr(id, "restored", Value::Bool(true))?;
                Ok(())
            })
            .build()?;

        let interval = ClassDef::builder("app", "Interval").dataclass(["low", "high"]).build()?;
        let catalog = ClassDef::builder("app", "Catalog").mapping().build()?;

        let stack_ref: SelfRef = Arc::default();
        let handle = Arc::clone(&stack_ref);
        let stack = ClassDef::builder("app", "Stack")
            .sequence(SequenceFlavor::List)
            .from_items(move |heap, items| {
                let class = upgrade(&handle)?;
                let stack = heap.instantiate(&class)?;
                if let Some(id) = stack.node_id() {
                    for item in items {
                        heap.items_push(id, item)?;
                    }
                }
                Ok(stack)
            })
            .build()?;
        let _ = stack_ref.set(Arc::downgrade(&stack));

        let bag = ClassDef::builder("app", "Bag").sequence(SequenceFlavor::Tuple).build()?;

        Ok(Self {
            point,
            forest,
            color,
            wrapper,
            record,
            counter,
            interval,
            catalog,
            stack,
            bag,
        })
    }

    /// Every fixture class.
    pub fn classes(&self) -> [&Arc<ClassDef>; 10] {
        [
            &self.point,
            &self.forest,
            &self.color,
            &self.wrapper,
            &self.record,
            &self.counter,
            &self.interval,
            &self.catalog,
            &self.stack,
            &self.bag,
        ]
    }

    /// A forge with every fixture class registered.
    pub fn forge(&self) -> Result<Forge> {
        self.forge_builder().build()
    }

    /// A builder with every fixture class registered, for further tuning.
    pub fn forge_builder(&self) -> ForgeBuilder {
        self.classes()
            .into_iter()
            .fold(Forge::builder(), |builder, class| builder.register(class))
    }

    pub fn point(&self, heap: &mut Heap, x: impl Into<Value>, y: impl Into<Value>) -> Result<Value> {
        Ok(heap.object(&self.point, [("x", x.into()), ("y", y.into())])?)
    }

    pub fn forest(&self, heap: &mut Heap, n_trees: i64, depth: i64) -> Result<Value> {
        Ok(self
            .forest
            .construct(heap, vec![("n_trees".into(), n_trees.into()), ("depth".into(), depth.into())])?)
    }

    pub fn color(&self, member: &str) -> Result<Value> {
        Ok(self.color.member(member)?)
    }

    pub fn wrap(&self, heap: &mut Heap, inner: Value) -> Result<Value> {
        Ok(heap.object(&self.wrapper, [("inner", inner)])?)
    }

    pub fn counter(&self, heap: &mut Heap, count: i64) -> Result<Value> {
        Ok(heap.object(&self.counter, [("count", count)])?)
    }

    pub fn interval(&self, heap: &mut Heap, low: impl Into<Value>, high: impl Into<Value>) -> Result<Value> {
        Ok(heap.object(&self.interval, [("low", low.into()), ("high", high.into())])?)
    }

    pub fn catalog(&self, heap: &mut Heap, title: &str, entries: Vec<(Value, Value)>) -> Result<Value> {
        let catalog = heap.object(&self.catalog, [("title", title)])?;
        if let Some(id) = catalog.node_id() {
            for (key, value) in entries {
                heap.dict_insert(id, key, value)?;
            }
        }
        Ok(catalog)
    }

    pub fn stack(&self, heap: &mut Heap, items: Vec<Value>) -> Result<Value> {
        self.sequence(heap, &self.stack, items)
    }

    pub fn bag(&self, heap: &mut Heap, items: Vec<Value>) -> Result<Value> {
        self.sequence(heap, &self.bag, items)
    }

    fn sequence(&self, heap: &mut Heap, class: &Arc<ClassDef>, items: Vec<Value>) -> Result<Value> {
        let obj = heap.instantiate(class)?;
        if let Some(id) = obj.node_id() {
            for item in items {
                heap.items_push(id, item)?;
            }
        }
        Ok(obj)
    }
}

/// A fixed calendar date for tests that need an atomic builtin leaf.
pub fn release_date() -> Value {
    NaiveDate::from_ymd_opt(2024, 2, 29).map_or(Value::None, Value::Date)
}
