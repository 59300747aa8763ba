/// Member lookup through a class hierarchy
///
/// At each level of the superclass chain the search order is: the primary
/// interface, then categories and class extensions in declaration order,
/// then adopted protocols depth first. Protocol qualifiers written on the
/// field type (`Helper<Extra>*`) are searched after the source type's own
/// protocols, before moving to the superclass. The first match wins.

use crate::model::{ContractId, Member, MemberKind, SourceModel, TypeId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Where a resolved member is declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Primary interface of `owner`
    Own { owner: String },
    /// Category or class extension of `owner`; an empty `extension` is a
    /// class extension
    Extension { owner: String, extension: String },
    /// Protocol reached while searching `owner`
    Contract { owner: String, contract: String },
}

/// A member found by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'m> {
    pub member: &'m Member,
    pub origin: Origin,
}

pub struct MemberResolver<'m, M: SourceModel + ?Sized> {
    model: &'m M,
}

impl<'m, M: SourceModel + ?Sized> MemberResolver<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Find a member of `kind` named `name` visible through `source`
    pub fn resolve(&self, source: TypeId, kind: MemberKind, name: &str) -> Option<Resolved<'m>> {
        self.resolve_qualified(source, &[], kind, name)
    }

    /// Like [`MemberResolver::resolve`], with extra protocols qualifying the
    /// source type
    pub fn resolve_qualified(
        &self,
        source: TypeId,
        qualifiers: &[ContractId],
        kind: MemberKind,
        name: &str,
    ) -> Option<Resolved<'m>> {
        let model = self.model;
        let mut visited_types = HashSet::new();
        let mut visited_contracts = HashSet::new();
        let mut extra = qualifiers;
        let mut current = Some(source);

        while let Some(ty) = current {
            if !visited_types.insert(ty) {
                warn!(class = model.type_name(ty), "cyclic superclass chain");
                break;
            }

            if let Some(found) = self.resolve_at(ty, extra, kind, name, &mut visited_contracts) {
                debug!(member = name, %kind, origin = ?found.origin, "resolved member");
                return Some(found);
            }

            extra = &[];
            current = model.superclass(ty);
        }

        debug!(member = name, %kind, source = model.type_name(source), "member not found");
        None
    }

    fn resolve_at(
        &self,
        ty: TypeId,
        extra: &[ContractId],
        kind: MemberKind,
        name: &str,
        visited: &mut HashSet<ContractId>,
    ) -> Option<Resolved<'m>> {
        let model = self.model;
        let owner = model.type_name(ty);

        if let Some(member) = find(model.own_members(ty), kind, name) {
            return Some(Resolved {
                member,
                origin: Origin::Own {
                    owner: owner.to_string(),
                },
            });
        }

        for extension in model.extensions(ty) {
            if let Some(member) = find(&extension.members, kind, name) {
                return Some(Resolved {
                    member,
                    origin: Origin::Extension {
                        owner: owner.to_string(),
                        extension: extension.name.clone(),
                    },
                });
            }
        }

        for &contract in model.conformed_contracts(ty).iter().chain(extra) {
            if let Some((member, found_in)) = self.search_contract(contract, kind, name, visited) {
                return Some(Resolved {
                    member,
                    origin: Origin::Contract {
                        owner: owner.to_string(),
                        contract: model.contract_name(found_in).to_string(),
                    },
                });
            }
        }

        None
    }

    /// Depth-first search of a protocol and its parents, each at most once
    fn search_contract(
        &self,
        contract: ContractId,
        kind: MemberKind,
        name: &str,
        visited: &mut HashSet<ContractId>,
    ) -> Option<(&'m Member, ContractId)> {
        if !visited.insert(contract) {
            return None;
        }

        let model = self.model;
        if let Some(member) = find(model.contract_members(contract), kind, name) {
            return Some((member, contract));
        }

        model
            .parent_contracts(contract)
            .iter()
            .find_map(|&parent| self.search_contract(parent, kind, name, visited))
    }
}

fn find<'a>(members: &'a [Member], kind: MemberKind, name: &str) -> Option<&'a Member> {
    members.iter().find(|m| m.kind == kind && m.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtensionBlock;

    /// Hand-built graph for exercising lookup order
    #[derive(Default)]
    struct TestModel {
        types: Vec<(String, Vec<Member>, Vec<ExtensionBlock>, Vec<ContractId>, Option<TypeId>)>,
        contracts: Vec<(String, Vec<Member>, Vec<ContractId>)>,
    }

    impl TestModel {
        fn class(&mut self, name: &str, members: Vec<Member>) -> TypeId {
            self.types.push((name.to_string(), members, vec![], vec![], None));
            TypeId(self.types.len() - 1)
        }

        fn protocol(&mut self, name: &str, members: Vec<Member>) -> ContractId {
            self.contracts.push((name.to_string(), members, vec![]));
            ContractId(self.contracts.len() - 1)
        }
    }

    impl SourceModel for TestModel {
        fn lookup_type(&self, name: &str) -> Option<TypeId> {
            self.types.iter().position(|t| t.0 == name).map(TypeId)
        }
        fn lookup_contract(&self, name: &str) -> Option<ContractId> {
            self.contracts.iter().position(|c| c.0 == name).map(ContractId)
        }
        fn type_name(&self, ty: TypeId) -> &str {
            &self.types[ty.0].0
        }
        fn contract_name(&self, contract: ContractId) -> &str {
            &self.contracts[contract.0].0
        }
        fn own_members(&self, ty: TypeId) -> &[Member] {
            &self.types[ty.0].1
        }
        fn extensions(&self, ty: TypeId) -> &[ExtensionBlock] {
            &self.types[ty.0].2
        }
        fn conformed_contracts(&self, ty: TypeId) -> &[ContractId] {
            &self.types[ty.0].3
        }
        fn contract_members(&self, contract: ContractId) -> &[Member] {
            &self.contracts[contract.0].1
        }
        fn parent_contracts(&self, contract: ContractId) -> &[ContractId] {
            &self.contracts[contract.0].2
        }
        fn superclass(&self, ty: TypeId) -> Option<TypeId> {
            self.types[ty.0].4
        }
        fn is_parameterized(&self, _ty: TypeId) -> bool {
            false
        }
    }

    fn reset(return_type: &str) -> Member {
        Member::method(MemberKind::InstanceMethod, "reset", return_type)
    }

    #[test]
    fn test_own_member_beats_category_and_protocol() {
        let mut model = TestModel::default();
        let proto = model.protocol("Resettable", vec![reset("BOOL")]);
        let helper = model.class("Helper", vec![reset("void")]);
        model.types[helper.0].2.push(ExtensionBlock {
            name: "Extra".to_string(),
            members: vec![reset("int")],
        });
        model.types[helper.0].3.push(proto);

        let found = MemberResolver::new(&model)
            .resolve(helper, MemberKind::InstanceMethod, "reset")
            .unwrap();
        assert_eq!(found.member.value_type, "void");
        assert_eq!(found.origin, Origin::Own { owner: "Helper".to_string() });
    }

    #[test]
    fn test_categories_in_declaration_order() {
        let mut model = TestModel::default();
        let helper = model.class("Helper", vec![]);
        for (name, ret) in [("First", "int"), ("Second", "long")] {
            model.types[helper.0].2.push(ExtensionBlock {
                name: name.to_string(),
                members: vec![reset(ret)],
            });
        }

        let found = MemberResolver::new(&model)
            .resolve(helper, MemberKind::InstanceMethod, "reset")
            .unwrap();
        assert_eq!(found.member.value_type, "int");
        assert!(matches!(found.origin, Origin::Extension { ref extension, .. } if extension == "First"));
    }

    #[test]
    fn test_ancestor_fallback() {
        let mut model = TestModel::default();
        let base = model.class("Base", vec![reset("void")]);
        let helper = model.class("Helper", vec![]);
        model.types[helper.0].4 = Some(base);

        let found = MemberResolver::new(&model)
            .resolve(helper, MemberKind::InstanceMethod, "reset")
            .unwrap();
        assert_eq!(found.origin, Origin::Own { owner: "Base".to_string() });
    }

    #[test]
    fn test_ancestor_several_levels_up() {
        let mut model = TestModel::default();
        let a = model.class("A", vec![reset("void")]);
        let b = model.class("B", vec![]);
        let c = model.class("C", vec![]);
        model.types[b.0].4 = Some(a);
        model.types[c.0].4 = Some(b);

        let resolver = MemberResolver::new(&model);
        let found = resolver.resolve(c, MemberKind::InstanceMethod, "reset").unwrap();
        assert_eq!(found.origin, Origin::Own { owner: "A".to_string() });
        assert_eq!(found.member.value_type, "void");

        assert!(resolver.resolve(c, MemberKind::InstanceMethod, "missing").is_none());
        assert!(resolver.resolve(c, MemberKind::ClassMethod, "reset").is_none());
    }

    #[test]
    fn test_protocol_on_source_beats_ancestor() {
        let mut model = TestModel::default();
        let proto = model.protocol("Resettable", vec![reset("BOOL")]);
        let base = model.class("Base", vec![reset("void")]);
        let helper = model.class("Helper", vec![]);
        model.types[helper.0].3.push(proto);
        model.types[helper.0].4 = Some(base);

        let found = MemberResolver::new(&model)
            .resolve(helper, MemberKind::InstanceMethod, "reset")
            .unwrap();
        assert_eq!(found.member.value_type, "BOOL");
    }

    #[test]
    fn test_parent_protocols_and_cycles_terminate() {
        let mut model = TestModel::default();
        let a = model.protocol("A", vec![]);
        let b = model.protocol("B", vec![reset("void")]);
        model.contracts[a.0].2 = vec![a, b];
        model.contracts[b.0].2 = vec![a];
        let helper = model.class("Helper", vec![]);
        model.types[helper.0].3.push(a);

        let resolver = MemberResolver::new(&model);
        let found = resolver.resolve(helper, MemberKind::InstanceMethod, "reset").unwrap();
        assert_eq!(
            found.origin,
            Origin::Contract {
                owner: "Helper".to_string(),
                contract: "B".to_string()
            }
        );
        assert!(resolver.resolve(helper, MemberKind::InstanceMethod, "missing").is_none());
    }

    #[test]
    fn test_cyclic_superclass_chain_terminates() {
        let mut model = TestModel::default();
        let a = model.class("A", vec![]);
        let b = model.class("B", vec![]);
        model.types[a.0].4 = Some(b);
        model.types[b.0].4 = Some(a);

        assert!(MemberResolver::new(&model)
            .resolve(a, MemberKind::InstanceMethod, "reset")
            .is_none());
    }

    #[test]
    fn test_kind_must_match() {
        let mut model = TestModel::default();
        let helper = model.class(
            "Helper",
            vec![
                Member::property("length", "NSNumber*"),
                Member::method(MemberKind::ClassMethod, "make", "Helper*"),
            ],
        );

        let resolver = MemberResolver::new(&model);
        assert!(resolver.resolve(helper, MemberKind::InstanceMethod, "length").is_none());
        assert!(resolver.resolve(helper, MemberKind::InstanceMethod, "make").is_none());
        assert!(resolver.resolve(helper, MemberKind::ClassMethod, "make").is_some());
        assert!(resolver.resolve(helper, MemberKind::InstanceProperty, "length").is_some());
    }

    #[test]
    fn test_qualifiers_searched_before_ancestors() {
        let mut model = TestModel::default();
        let extra = model.protocol("Extra", vec![reset("BOOL")]);
        let base = model.class("Base", vec![reset("void")]);
        let helper = model.class("Helper", vec![]);
        model.types[helper.0].4 = Some(base);

        let resolver = MemberResolver::new(&model);
        let plain = resolver.resolve(helper, MemberKind::InstanceMethod, "reset").unwrap();
        assert_eq!(plain.member.value_type, "void");

        let qualified = resolver
            .resolve_qualified(helper, &[extra], MemberKind::InstanceMethod, "reset")
            .unwrap();
        assert_eq!(qualified.member.value_type, "BOOL");
    }
}
