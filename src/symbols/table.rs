use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::{Diagnostic, FileId, Span};
use crate::error::{Error, Result};
use crate::types::Type;
use crate::validate::diagnostics::{self as validate_diagnostics, codes};

use super::{ClassFlags, ClassId, ClassKind, MethodSig, TypeMemberDef, Variance};

/// Ids of the symbols every table seeds at construction, mirroring the
/// hierarchy the runtime guarantees: `BasicObject` at the root, the
/// container classes generic over covariant members.
pub mod well_known {
    use super::ClassId;

    pub const BASIC_OBJECT: ClassId = ClassId(0);
    pub const OBJECT: ClassId = ClassId(1);
    pub const MODULE: ClassId = ClassId(2);
    pub const CLASS: ClassId = ClassId(3);
    pub const NIL_CLASS: ClassId = ClassId(4);
    pub const NUMERIC: ClassId = ClassId(5);
    pub const INTEGER: ClassId = ClassId(6);
    pub const FLOAT: ClassId = ClassId(7);
    pub const STRING: ClassId = ClassId(8);
    pub const SYMBOL: ClassId = ClassId(9);
    pub const TRUE_CLASS: ClassId = ClassId(10);
    pub const FALSE_CLASS: ClassId = ClassId(11);
    pub const ENUMERABLE: ClassId = ClassId(12);
    pub const ARRAY: ClassId = ClassId(13);
    pub const HASH: ClassId = ClassId(14);
    pub const PROC: ClassId = ClassId(15);

    pub(super) const COUNT: u32 = 16;
}

/// A resolved class or module declaration.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub superclass: Option<ClassId>,
    /// Mixins in declaration order; later includes shadow earlier ones.
    pub mixins: Vec<ClassId>,
    /// Modules extended onto the singleton class, declaration order.
    pub singleton_mixins: Vec<ClassId>,
    pub type_members: Vec<TypeMemberDef>,
    pub flags: ClassFlags,
    /// Classes without a nameable constant (e.g. `Class.new` results).
    pub anonymous: bool,
    /// Seeded core symbols skip variance validation.
    pub synthetic: bool,
    pub unit: FileId,
    pub span: Option<Span>,
    /// Instance methods in declaration order; duplicates are redefinitions
    /// and the last declaration wins for resolution.
    pub methods: Vec<MethodSig>,
    pub singleton_methods: Vec<MethodSig>,
    /// Units in which this type was marked sealed.
    pub sealed_units: Vec<FileId>,
    ancestors: Vec<ClassId>,
}

impl ClassDef {
    fn new(name: String, kind: ClassKind, superclass: Option<ClassId>, unit: FileId) -> Self {
        Self {
            name,
            kind,
            superclass,
            mixins: Vec::new(),
            singleton_mixins: Vec::new(),
            type_members: Vec::new(),
            flags: ClassFlags::default(),
            anonymous: false,
            synthetic: false,
            unit,
            span: None,
            methods: Vec::new(),
            singleton_methods: Vec::new(),
            sealed_units: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(self.kind, ClassKind::Class)
    }

    #[must_use]
    pub fn is_module(&self) -> bool {
        matches!(self.kind, ClassKind::Module)
    }

    /// Whether every declared instance method is abstract.
    #[must_use]
    pub fn is_fully_abstract(&self) -> bool {
        self.methods.iter().all(|method| method.mode.is_abstract())
    }
}

/// The symbol table for one analysis run.
///
/// Built single-threaded during the construction phase, then frozen;
/// queries after the freeze point are read-only and safe to share.
#[derive(Debug)]
pub struct SymbolTable {
    classes: Vec<ClassDef>,
    sealed_children: HashMap<ClassId, Vec<ClassId>>,
    frozen: bool,
}

impl SymbolTable {
    /// An unfrozen table with the core hierarchy seeded.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            classes: Vec::new(),
            sealed_children: HashMap::new(),
            frozen: false,
        };
        table.seed_core();
        table
    }

    fn seed_core(&mut self) {
        use well_known as wk;

        self.seed_class("BasicObject", ClassKind::Class, None);
        self.seed_class("Object", ClassKind::Class, Some(wk::BASIC_OBJECT));
        self.seed_class("Module", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Class", ClassKind::Class, Some(wk::MODULE));
        self.seed_class("NilClass", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Numeric", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Integer", ClassKind::Class, Some(wk::NUMERIC));
        self.seed_class("Float", ClassKind::Class, Some(wk::NUMERIC));
        self.seed_class("String", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Symbol", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("TrueClass", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("FalseClass", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Enumerable", ClassKind::Module, None);
        self.seed_class("Array", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Hash", ClassKind::Class, Some(wk::OBJECT));
        self.seed_class("Proc", ClassKind::Class, Some(wk::OBJECT));

        self.classes[wk::ENUMERABLE.0 as usize]
            .type_members
            .push(TypeMemberDef::new("Elem", Variance::Covariant));
        let array = &mut self.classes[wk::ARRAY.0 as usize];
        array.mixins.push(wk::ENUMERABLE);
        array
            .type_members
            .push(TypeMemberDef::new("Elem", Variance::Covariant));
        let hash = &mut self.classes[wk::HASH.0 as usize];
        hash.mixins.push(wk::ENUMERABLE);
        hash.type_members
            .push(TypeMemberDef::new("K", Variance::Covariant));
        hash.type_members
            .push(TypeMemberDef::new("V", Variance::Covariant));

        debug_assert_eq!(self.classes.len() as u32, well_known::COUNT);
    }

    fn seed_class(&mut self, name: &str, kind: ClassKind, superclass: Option<ClassId>) {
        let mut def = ClassDef::new(name.to_string(), kind, superclass, FileId::CORE);
        def.synthetic = true;
        self.classes.push(def);
    }

    fn ensure_unfrozen(&self, action: &str) -> Result<()> {
        if self.frozen {
            return Err(Error::frozen(format!(
                "cannot {action} after the symbol table is frozen"
            )));
        }
        Ok(())
    }

    fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    /// Register a class declared in `unit`.
    pub fn define_class(
        &mut self,
        name: impl Into<String>,
        superclass: Option<ClassId>,
        unit: FileId,
    ) -> Result<ClassId> {
        self.ensure_unfrozen("define a class")?;
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::new(
            name.into(),
            ClassKind::Class,
            superclass.or(Some(well_known::OBJECT)),
            unit,
        ));
        Ok(id)
    }

    /// Register a module declared in `unit`.
    pub fn define_module(&mut self, name: impl Into<String>, unit: FileId) -> Result<ClassId> {
        self.ensure_unfrozen("define a module")?;
        let id = ClassId(self.classes.len() as u32);
        self.classes
            .push(ClassDef::new(name.into(), ClassKind::Module, None, unit));
        Ok(id)
    }

    /// Record an `include`; re-including an already-included module is a
    /// no-op rather than an error.
    pub fn add_mixin(&mut self, class: ClassId, module: ClassId) -> Result<()> {
        self.ensure_unfrozen("add a mixin")?;
        let def = self.class_mut(class);
        if !def.mixins.contains(&module) {
            def.mixins.push(module);
        }
        Ok(())
    }

    /// Record an `extend` onto the singleton class.
    pub fn add_singleton_mixin(&mut self, class: ClassId, module: ClassId) -> Result<()> {
        self.ensure_unfrozen("add a singleton mixin")?;
        let def = self.class_mut(class);
        if !def.singleton_mixins.contains(&module) {
            def.singleton_mixins.push(module);
        }
        Ok(())
    }

    pub fn add_type_member(&mut self, class: ClassId, member: TypeMemberDef) -> Result<()> {
        self.ensure_unfrozen("add a type member")?;
        self.class_mut(class).type_members.push(member);
        Ok(())
    }

    pub fn add_method(&mut self, class: ClassId, mut method: MethodSig) -> Result<()> {
        self.ensure_unfrozen("add a method")?;
        method.owner = Some(class);
        self.class_mut(class).methods.push(method);
        Ok(())
    }

    pub fn add_singleton_method(&mut self, class: ClassId, mut method: MethodSig) -> Result<()> {
        self.ensure_unfrozen("add a singleton method")?;
        method.owner = Some(class);
        self.class_mut(class).singleton_methods.push(method);
        Ok(())
    }

    pub fn mark_abstract(&mut self, class: ClassId) -> Result<()> {
        self.ensure_unfrozen("mark a type abstract")?;
        self.class_mut(class).flags.is_abstract = true;
        Ok(())
    }

    /// Interfaces are abstract modules whose every method must be abstract.
    pub fn mark_interface(&mut self, class: ClassId) -> Result<()> {
        self.ensure_unfrozen("mark a type as an interface")?;
        let def = self.class_mut(class);
        def.flags.is_interface = true;
        def.flags.is_abstract = true;
        Ok(())
    }

    pub fn mark_final(&mut self, class: ClassId) -> Result<()> {
        self.ensure_unfrozen("mark a type final")?;
        self.class_mut(class).flags.is_final = true;
        Ok(())
    }

    /// Record `sealed!` declared in `unit`; the permitted-subclass set is
    /// limited to declarations in that unit.
    pub fn mark_sealed(&mut self, class: ClassId, unit: FileId) -> Result<()> {
        self.ensure_unfrozen("mark a type sealed")?;
        let def = self.class_mut(class);
        def.flags.is_sealed = true;
        if !def.sealed_units.contains(&unit) {
            def.sealed_units.push(unit);
        }
        Ok(())
    }

    pub fn mark_anonymous(&mut self, class: ClassId) -> Result<()> {
        self.ensure_unfrozen("mark a type anonymous")?;
        self.class_mut(class).anonymous = true;
        Ok(())
    }

    pub fn set_span(&mut self, class: ClassId, span: Span) -> Result<()> {
        self.ensure_unfrozen("set a declaration span")?;
        self.class_mut(class).span = Some(span);
        Ok(())
    }

    /// Finish the construction phase: linearize ancestors, record the
    /// sealed-subclass registry, and detect type-member bound cycles.
    ///
    /// Returns the construction diagnostics discovered while freezing;
    /// cyclic type-member bounds are degraded to the unresolved sentinel
    /// so later queries still run.
    pub fn freeze(&mut self) -> Vec<Diagnostic> {
        debug!(classes = self.classes.len(), "freezing symbol table");
        for index in 0..self.classes.len() {
            let id = ClassId(index as u32);
            let ancestors = self.linearize(id);
            self.classes[index].ancestors = ancestors;
        }
        self.record_sealed_children();
        let diagnostics = self.break_type_member_cycles();
        self.frozen = true;
        diagnostics
    }

    fn linearize(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        self.linearize_into(id, &mut out);
        out
    }

    fn linearize_into(&self, id: ClassId, out: &mut Vec<ClassId>) {
        if out.contains(&id) {
            return;
        }
        out.push(id);
        let def = &self.classes[id.0 as usize];
        // Later includes shadow earlier ones, so walk in reverse.
        for mixin in def.mixins.iter().rev() {
            self.linearize_into(*mixin, out);
        }
        if let Some(superclass) = def.superclass {
            self.linearize_into(superclass, out);
        }
    }

    fn record_sealed_children(&mut self) {
        let mut children: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
        for (index, def) in self.classes.iter().enumerate() {
            let id = ClassId(index as u32);
            if let Some(superclass) = def.superclass {
                let parent = &self.classes[superclass.0 as usize];
                if parent.flags.is_sealed && parent.sealed_units.contains(&def.unit) {
                    children.entry(superclass).or_default().push(id);
                }
            }
            for mixin in &def.mixins {
                let parent = &self.classes[mixin.0 as usize];
                if parent.flags.is_sealed && parent.sealed_units.contains(&def.unit) {
                    children.entry(*mixin).or_default().push(id);
                }
            }
        }
        self.sealed_children = children;
    }

    fn break_type_member_cycles(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut states: HashMap<(ClassId, usize), VisitState> = HashMap::new();
        let nodes: Vec<(ClassId, usize)> = self
            .classes
            .iter()
            .enumerate()
            .flat_map(|(index, def)| {
                (0..def.type_members.len()).map(move |member| (ClassId(index as u32), member))
            })
            .collect();
        for node in nodes {
            self.visit_member_node(node, &mut states, &mut diagnostics);
        }
        diagnostics
    }

    fn visit_member_node(
        &mut self,
        node: (ClassId, usize),
        states: &mut HashMap<(ClassId, usize), VisitState>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match states.get(&node) {
            Some(VisitState::Done) => return,
            Some(VisitState::Visiting) => return,
            None => {}
        }
        states.insert(node, VisitState::Visiting);
        let (class, member) = node;
        let refs = {
            let def = &self.classes[class.0 as usize].type_members[member];
            let mut refs = Vec::new();
            for bound in [&def.fixed, &def.upper, &def.lower].into_iter().flatten() {
                bound.collect_type_member_refs(&mut refs);
            }
            refs
        };
        for (owner, name) in refs {
            let Some(target_index) = self
                .classes
                .get(owner.0 as usize)
                .and_then(|def| def.type_members.iter().position(|m| m.name == name))
            else {
                continue;
            };
            let target = (owner, target_index);
            if states.get(&target) == Some(&VisitState::Visiting) {
                let (class_name, member_name) = {
                    let def = &self.classes[class.0 as usize];
                    (def.name.clone(), def.type_members[member].name.clone())
                };
                diagnostics.push(validate_diagnostics::error(
                    codes::TYPE_MEMBER_CYCLE,
                    format!(
                        "type member `{member_name}` of `{class_name}` participates in a cyclic bound and was degraded to an unresolved type"
                    ),
                    self.classes[class.0 as usize].span,
                ));
                let def = &mut self.classes[class.0 as usize].type_members[member];
                if def.fixed.is_some() {
                    def.fixed = Some(Type::unresolved());
                }
                if def.upper.is_some() {
                    def.upper = Some(Type::unresolved());
                }
                if def.lower.is_some() {
                    def.lower = Some(Type::unresolved());
                }
                continue;
            }
            self.visit_member_node(target, states, diagnostics);
        }
        states.insert(node, VisitState::Done);
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    #[must_use]
    pub fn name(&self, id: ClassId) -> &str {
        &self.classes[id.0 as usize].name
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|index| ClassId(index as u32))
    }

    /// The frozen ancestor linearization, most-derived first, starting
    /// with the class itself.
    #[must_use]
    pub fn ancestors(&self, id: ClassId) -> &[ClassId] {
        debug_assert!(self.frozen, "ancestor query before freeze");
        &self.classes[id.0 as usize].ancestors
    }

    #[must_use]
    pub fn derives_from(&self, id: ClassId, ancestor: ClassId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Find a class by fully-qualified name. Reloaded constants can leave
    /// several ids sharing a name; the most recent definition wins.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .rposition(|def| def.name == name)
            .map(|index| ClassId(index as u32))
    }

    /// The method declared directly on `class`; the last declaration wins.
    #[must_use]
    pub fn find_method(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.classes[class.0 as usize]
            .methods
            .iter()
            .rev()
            .find(|method| method.name == name)
    }

    #[must_use]
    pub fn find_singleton_method(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.classes[class.0 as usize]
            .singleton_methods
            .iter()
            .rev()
            .find(|method| method.name == name)
    }

    /// Resolve an instance method through the ancestor linearization.
    #[must_use]
    pub fn find_method_transitive(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.ancestors(class)
            .iter()
            .find_map(|ancestor| self.find_method(*ancestor, name))
    }

    /// Resolve an instance method, skipping abstract declarations.
    #[must_use]
    pub fn find_concrete_method_transitive(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        self.ancestors(class)
            .iter()
            .filter_map(|ancestor| self.find_method(*ancestor, name))
            .find(|method| !method.mode.is_abstract())
    }

    /// Resolve a singleton method: own singleton methods, extended
    /// modules (whose instance methods become singleton methods of the
    /// extender), then the superclass chain.
    #[must_use]
    pub fn find_singleton_method_transitive(&self, class: ClassId, name: &str) -> Option<&MethodSig> {
        let mut current = Some(class);
        while let Some(id) = current {
            if let Some(method) = self.find_singleton_method(id, name) {
                return Some(method);
            }
            let def = &self.classes[id.0 as usize];
            for mixin in def.singleton_mixins.iter().rev() {
                if let Some(method) = self.find_method_transitive(*mixin, name) {
                    return Some(method);
                }
            }
            current = def.superclass;
        }
        None
    }

    #[must_use]
    pub fn find_concrete_singleton_method_transitive(
        &self,
        class: ClassId,
        name: &str,
    ) -> Option<&MethodSig> {
        let mut current = Some(class);
        while let Some(id) = current {
            if let Some(method) = self
                .find_singleton_method(id, name)
                .filter(|method| !method.mode.is_abstract())
            {
                return Some(method);
            }
            let def = &self.classes[id.0 as usize];
            for mixin in def.singleton_mixins.iter().rev() {
                if let Some(method) = self
                    .find_method_transitive(*mixin, name)
                    .filter(|method| !method.mode.is_abstract())
                {
                    return Some(method);
                }
            }
            current = def.superclass;
        }
        None
    }

    /// The direct subclasses/includers a sealed type permits: exactly the
    /// ones declared in the sealed type's own defining units, in
    /// declaration order. Frozen with the table.
    #[must_use]
    pub fn sealed_subclasses(&self, id: ClassId) -> &[ClassId] {
        debug_assert!(self.frozen, "sealed query before freeze");
        self.sealed_children
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Exhaustiveness helper: the permitted subclasses of a sealed type
    /// that `handled` does not cover.
    #[must_use]
    pub fn unhandled_sealed_cases(&self, id: ClassId, handled: &[ClassId]) -> Vec<ClassId> {
        self.sealed_subclasses(id)
            .iter()
            .copied()
            .filter(|child| !handled.contains(child))
            .collect()
    }

    /// The declared variance of a type member, looked up by owner and name.
    #[must_use]
    pub fn type_member(&self, owner: ClassId, name: &str) -> Option<&TypeMemberDef> {
        self.classes[owner.0 as usize]
            .type_members
            .iter()
            .find(|member| member.name == name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Done,
}
