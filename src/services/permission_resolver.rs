// src/services/permission_resolver.rs

// Função pura: (permissões dos cargos, exceções do usuário) -> conjunto efetivo.
// Sem I/O e sem erro: códigos desconhecidos passam adiante como estão.

use crate::models::rbac::{
    OverrideType, PermissionCode, PermissionOverride, PermissionSet, Role, UserAccess,
};

pub fn resolve<I>(role_permissions: I, overrides: &[PermissionOverride]) -> PermissionSet
where
    I: IntoIterator<Item = PermissionCode>,
{
    // 1. União das permissões dos cargos
    let mut effective: PermissionSet = role_permissions.into_iter().collect();

    // Exceções sobre código protegido nunca valem, mesmo que o servidor tenha deixado passar
    let applicable = || {
        overrides
            .iter()
            .filter(|o| o.is_active && !o.permission_code.is_protected())
    };

    // 2. GRANT
    for o in applicable().filter(|o| o.override_type == OverrideType::Grant) {
        effective.insert(o.permission_code.clone());
    }

    // 3. DENY, sempre depois de GRANT, qualquer que seja a ordem recebida
    for o in applicable().filter(|o| o.override_type == OverrideType::Deny) {
        effective.remove(&o.permission_code);
    }

    effective
}

pub fn resolve_roles(roles: &[Role], overrides: &[PermissionOverride]) -> PermissionSet {
    resolve(
        roles.iter().flat_map(|r| r.permissions.iter().cloned()),
        overrides,
    )
}

pub fn resolve_access(access: &UserAccess) -> PermissionSet {
    resolve_roles(&access.roles, &access.overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::models::rbac::PermissionCode::*;

    fn role(name: &str, permissions: &[PermissionCode]) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.into(),
            organization_id: None,
            permissions: permissions.to_vec(),
        }
    }

    fn rule(code: PermissionCode, override_type: OverrideType) -> PermissionOverride {
        PermissionOverride {
            id: Some(Uuid::new_v4()),
            user_id: Uuid::nil(),
            permission_code: code,
            override_type,
            is_active: true,
            created_by: None,
            created_at: None,
            revoked_by: None,
            revoked_at: None,
            reason: Some("teste".into()),
        }
    }

    fn cashier() -> Role {
        role(
            "Cashier",
            &[ViewInventory, CreateSale, PostSale, ProcessReturn, ClockInOut, ViewCommunications, ViewPromotions],
        )
    }

    #[test]
    fn without_overrides_effective_is_the_union_of_roles() {
        let roles = vec![
            cashier(),
            role("Estoquista", &[ViewInventory, ManageInventory, ManageCounts]),
            role("Vazio", &[]),
        ];

        let effective = resolve_roles(&roles, &[]);

        let expected: PermissionSet = roles.iter().flat_map(|r| r.permissions.clone()).collect();
        assert_eq!(effective, expected);
        assert_eq!(effective.len(), 9);
    }

    #[test]
    fn deny_override_removes_role_grant() {
        // Papel concede VIEW_INVENTORY, exceção DENY remove
        let roles = vec![role("Leitura", &[ViewInventory])];
        let effective = resolve_roles(&roles, &[rule(ViewInventory, OverrideType::Deny)]);
        assert!(!effective.contains(&ViewInventory));
        assert!(effective.is_empty());
    }

    #[test]
    fn cashier_with_register_grant_has_eight_permissions() {
        let effective = resolve_roles(&[cashier()], &[rule(ManageRegister, OverrideType::Grant)]);
        assert_eq!(effective.len(), 8);
        assert!(effective.contains(&ManageRegister));
    }

    #[test]
    fn deny_wins_over_grant_in_any_order() {
        let a = [rule(ManageUsers, OverrideType::Grant), rule(ManageUsers, OverrideType::Deny)];
        let b = [rule(ManageUsers, OverrideType::Deny), rule(ManageUsers, OverrideType::Grant)];

        assert!(!resolve(vec![], &a).contains(&ManageUsers));
        assert!(!resolve(vec![], &b).contains(&ManageUsers));
    }

    #[test]
    fn protected_code_ignores_overrides() {
        let dev = vec![role("Dev", &[DeveloperAccess, ViewReports])];

        let denied = resolve_roles(&dev, &[rule(DeveloperAccess, OverrideType::Deny)]);
        assert!(denied.contains(&DeveloperAccess));

        let granted = resolve_roles(&[cashier()], &[rule(DeveloperAccess, OverrideType::Grant)]);
        assert!(!granted.contains(&DeveloperAccess));
    }

    #[test]
    fn inactive_overrides_are_ignored() {
        let mut revoked = rule(ViewInventory, OverrideType::Deny);
        revoked.is_active = false;
        let effective = resolve_roles(&[cashier()], &[revoked]);
        assert!(effective.contains(&ViewInventory));
    }

    #[test]
    fn applying_the_same_overrides_twice_is_idempotent() {
        let overrides = vec![
            rule(ManageRegister, OverrideType::Grant),
            rule(PostSale, OverrideType::Deny),
            rule(PermissionCode::parse("EXPORT_LEDGER"), OverrideType::Grant),
        ];
        let once = resolve_roles(&[cashier()], &overrides);
        let twice = resolve(once.clone(), &overrides);
        let doubled: Vec<_> = overrides.iter().chain(overrides.iter()).cloned().collect();

        assert_eq!(once, twice);
        assert_eq!(once, resolve_roles(&[cashier()], &doubled));
    }

    #[test]
    fn unknown_codes_pass_through() {
        let code = PermissionCode::parse("SCHEDULE_SHIFTS");
        let effective = resolve(vec![code.clone()], &[]);
        assert!(effective.contains(&code));
    }

    #[test]
    fn never_contains_a_denied_code_and_never_loses_protected_code() {
        // Todas as combinações de GRANT/DENY/nada para um punhado de códigos
        let codes = [ViewInventory, ManageRegister, DeveloperAccess];
        let role_sets: [&[PermissionCode]; 3] = [&[], &[ViewInventory, DeveloperAccess], &[ManageRegister]];

        for base in role_sets {
            for mask in 0..27u32 {
                let mut overrides = Vec::new();
                let mut m = mask;
                for code in &codes {
                    match m % 3 {
                        1 => overrides.push(rule(code.clone(), OverrideType::Grant)),
                        2 => overrides.push(rule(code.clone(), OverrideType::Deny)),
                        _ => {}
                    }
                    m /= 3;
                }

                let effective = resolve(base.to_vec(), &overrides);

                for o in &overrides {
                    if o.override_type == OverrideType::Deny && !o.permission_code.is_protected() {
                        assert!(!effective.contains(&o.permission_code));
                    }
                }
                assert_eq!(
                    effective.contains(&DeveloperAccess),
                    base.contains(&DeveloperAccess)
                );
            }
        }
    }
}
