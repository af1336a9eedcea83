use crate::model::{IdlModel, Type};
use crate::utils::qualify_name;
use log::debug;
use std::collections::HashMap;

/// Merges a resolved import into the importing file's model.
///
/// A sub-model that declares a namespace is qualified first (see [`qualify`]);
/// one without a namespace contributes its declarations unchanged.
pub fn merge(parent: &mut IdlModel, sub: IdlModel) {
    let sub = if sub.root_namespace.is_empty() {
        debug!("merging {} without a namespace", sub.file);
        sub
    } else {
        let namespace = sub.root_namespace.clone();
        qualify(sub, &namespace)
    };

    parent.structs.extend(sub.structs);
    parent.enums.extend(sub.enums);
    parent.interfaces.extend(sub.interfaces);
}

/// Prefixes every declaration that belongs to `namespace` with `namespace.`
/// and rewrites the references those declarations make to each other.
///
/// Declarations the model pulled in from its own imports carry another
/// namespace and are left untouched, so each import edge applies exactly one
/// level of qualification.
pub fn qualify(mut model: IdlModel, namespace: &str) -> IdlModel {
    let struct_names = model
        .structs
        .iter()
        .filter(|s| s.namespace == namespace)
        .map(|s| s.name.clone());
    let enum_names = model
        .enums
        .iter()
        .filter(|e| e.namespace == namespace)
        .map(|e| e.name.clone());
    let interface_names = model
        .interfaces
        .iter()
        .filter(|i| i.namespace == namespace)
        .map(|i| i.name.clone());
    let names: HashMap<String, String> = struct_names
        .chain(enum_names)
        .chain(interface_names)
        .map(|name| {
            let qualified = qualify_name(namespace, &name);
            (name, qualified)
        })
        .collect();
    debug!("qualifying {} declarations with {namespace}", names.len());

    let rewrite = |ty: &mut Type| {
        ty.for_each_ref_mut(&mut |type_ref| {
            if let Some(qualified) = names.get(&type_ref.name) {
                type_ref.name = qualified.clone();
            }
        });
    };

    for s in model.structs.iter_mut().filter(|s| s.namespace == namespace) {
        s.name = qualify_name(namespace, &s.name);
        for field in &mut s.fields {
            rewrite(&mut field.ty);
        }
        if let Some(qualified) = names.get(&s.extends) {
            s.extends = qualified.clone();
        }
    }
    for e in model.enums.iter_mut().filter(|e| e.namespace == namespace) {
        e.name = qualify_name(namespace, &e.name);
    }
    for i in model.interfaces.iter_mut().filter(|i| i.namespace == namespace) {
        i.name = qualify_name(namespace, &i.name);
        for method in &mut i.methods {
            if let Some(ty) = method.return_type.as_mut() {
                rewrite(ty);
            }
            for param in &mut method.parameters {
                rewrite(&mut param.ty);
            }
        }
    }

    model
}
