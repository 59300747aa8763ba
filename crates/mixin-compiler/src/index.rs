/// Declaration index built from parsed headers
///
/// Every class, category and protocol of every translation unit is folded
/// into one graph keyed by name. Categories attach to their class no matter
/// which unit declares them, and the protocols they adopt are appended to
/// the class conformance list.

use crate::model::{
    AnnotatedMember, ContractId, ExtensionBlock, FieldKind, Member, SourceModel, TypeId,
};
use mixin_parser::{Annotation, IvarDecl, Item, MemberDecl, PROVIDE_TAG, TranslationUnit};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct TypeEntry {
    name: String,
    superclass: Option<TypeId>,
    parameterized: bool,
    declared: bool,
    members: Vec<Member>,
    extensions: Vec<ExtensionBlock>,
    contracts: Vec<ContractId>,
}

#[derive(Debug, Default)]
struct ContractEntry {
    name: String,
    parents: Vec<ContractId>,
    members: Vec<Member>,
}

/// In-memory [`SourceModel`] over a set of translation units
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    types: Vec<TypeEntry>,
    type_names: HashMap<String, TypeId>,
    contracts: Vec<ContractEntry>,
    contract_names: HashMap<String, ContractId>,
}

impl DeclarationIndex {
    /// Build the index; units are expected in dependency order
    pub fn build<'u>(units: impl IntoIterator<Item = &'u TranslationUnit>) -> Self {
        let units: Vec<&TranslationUnit> = units.into_iter().collect();
        let mut index = DeclarationIndex::default();

        // Register every name first so forward references resolve.
        for item in units.iter().flat_map(|unit| &unit.items) {
            match item {
                Item::Interface(decl) => {
                    index.type_entry(&decl.name);
                }
                Item::Category(decl) => {
                    index.type_entry(&decl.class_name);
                }
                Item::Protocol(decl) => {
                    index.contract_entry(&decl.name);
                }
                Item::Import(_) | Item::Implementation(_) => {}
            }
        }

        for item in units.iter().flat_map(|unit| &unit.items) {
            match item {
                Item::Interface(decl) => {
                    let id = index.type_entry(&decl.name);
                    let superclass = decl.superclass.as_deref().and_then(|name| {
                        let found = index.type_names.get(name).copied();
                        if found.is_none() {
                            debug!(class = %decl.name, superclass = name, "superclass outside the model, treated as root");
                        }
                        found
                    });
                    let contracts = index.contract_ids(&decl.protocols);

                    let entry = &mut index.types[id.0];
                    if entry.declared {
                        warn!(class = %decl.name, "duplicate @interface, merging members");
                    } else {
                        entry.superclass = superclass;
                    }
                    entry.declared = true;
                    entry.parameterized |= !decl.generic_params.is_empty();
                    entry.members.extend(decl.members.iter().map(to_member));
                    push_unique(&mut entry.contracts, contracts);
                }
                Item::Category(decl) => {
                    let id = index.type_entry(&decl.class_name);
                    let contracts = index.contract_ids(&decl.protocols);

                    let entry = &mut index.types[id.0];
                    entry.extensions.push(ExtensionBlock {
                        name: decl.name.clone(),
                        members: decl.members.iter().map(to_member).collect(),
                    });
                    push_unique(&mut entry.contracts, contracts);
                }
                Item::Protocol(decl) => {
                    let id = index.contract_entry(&decl.name);
                    let parents = index.contract_ids(&decl.parents);

                    let entry = &mut index.contracts[id.0];
                    if !entry.members.is_empty() || !entry.parents.is_empty() {
                        debug!(protocol = %decl.name, "protocol declared twice, keeping the first");
                        continue;
                    }
                    entry.parents = parents;
                    entry.members = decl.members.iter().map(to_member).collect();
                }
                Item::Import(_) | Item::Implementation(_) => {}
            }
        }

        debug!(
            types = index.types.len(),
            protocols = index.contracts.len(),
            "built declaration index"
        );
        index
    }

    fn type_entry(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.type_names.get(name) {
            return id;
        }
        let id = TypeId(self.types.len());
        self.types.push(TypeEntry {
            name: name.to_string(),
            ..TypeEntry::default()
        });
        self.type_names.insert(name.to_string(), id);
        id
    }

    fn contract_entry(&mut self, name: &str) -> ContractId {
        if let Some(&id) = self.contract_names.get(name) {
            return id;
        }
        let id = ContractId(self.contracts.len());
        self.contracts.push(ContractEntry {
            name: name.to_string(),
            ..ContractEntry::default()
        });
        self.contract_names.insert(name.to_string(), id);
        id
    }

    /// Known protocols among `names`; unknown ones (system headers) are skipped
    fn contract_ids(&self, names: &[String]) -> Vec<ContractId> {
        names
            .iter()
            .filter_map(|name| {
                let id = self.contract_names.get(name).copied();
                if id.is_none() {
                    debug!(protocol = %name, "protocol outside the model, ignored");
                }
                id
            })
            .collect()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn to_member(decl: &MemberDecl) -> Member {
    match decl {
        MemberDecl::Method(method) => Member::from(method),
        MemberDecl::Property(property) => Member::from(property),
    }
}

fn push_unique(target: &mut Vec<ContractId>, ids: Vec<ContractId>) {
    for id in ids {
        if !target.contains(&id) {
            target.push(id);
        }
    }
}

impl SourceModel for DeclarationIndex {
    fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    fn lookup_contract(&self, name: &str) -> Option<ContractId> {
        self.contract_names.get(name).copied()
    }

    fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.0].name
    }

    fn contract_name(&self, contract: ContractId) -> &str {
        &self.contracts[contract.0].name
    }

    fn own_members(&self, ty: TypeId) -> &[Member] {
        &self.types[ty.0].members
    }

    fn extensions(&self, ty: TypeId) -> &[ExtensionBlock] {
        &self.types[ty.0].extensions
    }

    fn conformed_contracts(&self, ty: TypeId) -> &[ContractId] {
        &self.types[ty.0].contracts
    }

    fn contract_members(&self, contract: ContractId) -> &[Member] {
        &self.contracts[contract.0].members
    }

    fn parent_contracts(&self, contract: ContractId) -> &[ContractId] {
        &self.contracts[contract.0].parents
    }

    fn superclass(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.0].superclass
    }

    fn is_parameterized(&self, ty: TypeId) -> bool {
        self.types[ty.0].parameterized
    }
}

/// Provide payloads among `annotations`, with the tag stripped
fn provide_payloads(annotations: &[Annotation]) -> Vec<String> {
    annotations
        .iter()
        .filter_map(|a| {
            let rest = a.value.trim_start().strip_prefix(PROVIDE_TAG)?;
            // `__provide__x` is some other annotation
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return None;
            }
            Some(rest.trim().to_string())
        })
        .collect()
}

fn collect_ivars(owner: &str, ivars: &[IvarDecl], out: &mut Vec<AnnotatedMember>) {
    for ivar in ivars {
        let payloads = provide_payloads(&ivar.annotations);
        if payloads.is_empty() {
            continue;
        }
        out.push(AnnotatedMember {
            owner: owner.to_string(),
            name: ivar.name.clone(),
            field_kind: FieldKind::Ivar,
            declared_type: ivar.ty.clone(),
            payloads,
        });
    }
}

fn collect_properties(owner: &str, members: &[MemberDecl], out: &mut Vec<AnnotatedMember>) {
    for member in members {
        let MemberDecl::Property(property) = member else {
            continue;
        };
        let payloads = provide_payloads(&property.annotations);
        if payloads.is_empty() {
            continue;
        }
        out.push(AnnotatedMember {
            owner: owner.to_string(),
            name: property.name.clone(),
            field_kind: FieldKind::Property,
            declared_type: property.ty.clone(),
            payloads,
        });
    }
}

/// Properties and ivars of `unit` carrying provide annotations, in source order
pub fn annotated_members(unit: &TranslationUnit) -> Vec<AnnotatedMember> {
    let mut found = Vec::new();

    for item in &unit.items {
        match item {
            Item::Interface(decl) => {
                collect_ivars(&decl.name, &decl.ivars, &mut found);
                collect_properties(&decl.name, &decl.members, &mut found);
            }
            Item::Category(decl) => {
                collect_ivars(&decl.class_name, &decl.ivars, &mut found);
                collect_properties(&decl.class_name, &decl.members, &mut found);
            }
            Item::Implementation(decl) => {
                collect_ivars(&decl.class_name, &decl.ivars, &mut found);
            }
            Item::Protocol(decl) => {
                let annotated = decl.members.iter().any(|m| {
                    matches!(m, MemberDecl::Property(p) if !provide_payloads(&p.annotations).is_empty())
                });
                if annotated {
                    warn!(protocol = %decl.name, "provide annotations inside a protocol are ignored");
                }
            }
            Item::Import(_) => {}
        }
    }

    found
}
