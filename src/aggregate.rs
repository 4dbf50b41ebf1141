use crate::ast::{Chain, Extension};
use crate::error::{Diagnostic, ErrorKind};
use crate::model::{display_name, Constraints, FieldType, ResolvedField, SelectOption};
use crate::validate::ValidChain;
use indexmap::IndexMap;

/// In-progress state for one base name.
enum FieldBuilder {
    Single {
        chain: Chain,
        field_type: FieldType,
    },
    Select {
        element_id: String,
        options: Vec<SelectOption>,
        editable: bool,
        track_role: Option<String>,
    },
}

impl FieldBuilder {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldBuilder::Single { field_type, .. } => field_type.as_str(),
            FieldBuilder::Select { .. } => FieldType::Select.as_str(),
        }
    }
}

/// Group validated chains by base name and build one field per group.
///
/// Option chains sharing a base name merge into a single `select` field with
/// options in first-seen order. Output order is the first appearance of each
/// base name. Group conflicts are pushed onto `diagnostics`; the offending
/// group still gets a field here and is dropped by the caller.
pub fn aggregate(chains: Vec<ValidChain>, diagnostics: &mut Vec<Diagnostic>) -> Vec<ResolvedField> {
    let mut builders: IndexMap<String, FieldBuilder> = IndexMap::new();

    for ValidChain { chain, field_type } in chains {
        match builders.get_mut(&chain.base_name) {
            None => {
                let key = chain.base_name.clone();
                let builder = if field_type == FieldType::Select {
                    let mut select = FieldBuilder::Select {
                        element_id: chain.element_id.clone(),
                        options: Vec::new(),
                        editable: false,
                        track_role: None,
                    };
                    add_option(&mut select, &chain, diagnostics);
                    select
                } else {
                    FieldBuilder::Single { chain, field_type }
                };
                builders.insert(key, builder);
            }
            Some(existing)
                if matches!(existing, FieldBuilder::Select { .. })
                    && field_type == FieldType::Select =>
            {
                add_option(existing, &chain, diagnostics);
            }
            Some(existing) => {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorKind::ConflictingType,
                        &chain.base_name,
                        format!(
                            "`{}` is already declared as `{}`; element `{}` declares it again as `{}`",
                            chain.base_name,
                            existing.kind_name(),
                            chain.element_id,
                            field_type.as_str()
                        ),
                    )
                    .with_element(&chain.element_id),
                );
            }
        }
    }

    builders
        .into_iter()
        .map(|(base_name, builder)| finish(base_name, builder))
        .collect()
}

fn add_option(builder: &mut FieldBuilder, chain: &Chain, diagnostics: &mut Vec<Diagnostic>) {
    let FieldBuilder::Select {
        options,
        editable,
        track_role,
        ..
    } = builder
    else {
        return;
    };
    let Some(key) = chain.option_key() else {
        return;
    };

    if options.iter().any(|option| option.key == key) {
        diagnostics.push(
            Diagnostic::new(
                ErrorKind::DuplicateOption,
                &chain.base_name,
                format!("option `{}` is declared more than once", key),
            )
            .with_element(&chain.element_id),
        );
        return;
    }

    let role = chain.track_role();
    if let (Some(existing), Some(role)) = (track_role.as_deref(), role) {
        if existing != role {
            diagnostics.push(
                Diagnostic::new(
                    ErrorKind::ConflictingType,
                    &chain.base_name,
                    format!(
                        "option `{}` names track role `{}` but the field already uses `{}`",
                        key, role, existing
                    ),
                )
                .with_element(&chain.element_id),
            );
        }
    }
    if track_role.is_none() {
        *track_role = role.map(str::to_string);
    }
    *editable |= chain.has(|ext| matches!(ext, Extension::Editable));

    let label = key.replace('_', " ");
    let text = chain.default_text.trim();
    options.push(SelectOption {
        key: key.to_string(),
        display_text: if text.is_empty() {
            label.clone()
        } else {
            text.to_string()
        },
        label,
        value: chain.element_id.clone(),
        is_default_track_role: role.is_some(),
    });
}

fn finish(base_name: String, builder: FieldBuilder) -> ResolvedField {
    let field = match builder {
        FieldBuilder::Single { chain, field_type } => ResolvedField {
            name: display_name(&base_name),
            field_type,
            element_id: chain.element_id.clone(),
            default_value: chain.default_text.trim().to_string(),
            constraints: Constraints {
                max_length: chain.max_length(),
                generated: chain.has(|ext| matches!(ext, Extension::Gen)),
            },
            date_format: chain.date_format().cloned(),
            options: None,
            depends_on: chain.dependency().cloned(),
            tracking_id: chain.has(|ext| matches!(ext, Extension::TrackingId)),
            link: chain.link().map(str::to_string),
            editable: chain.has(|ext| matches!(ext, Extension::Editable)),
            track_role: chain.track_role().map(str::to_string),
            base_name,
        },
        FieldBuilder::Select {
            element_id,
            options,
            editable,
            track_role,
        } => ResolvedField {
            name: display_name(&base_name),
            field_type: FieldType::Select,
            element_id,
            default_value: options
                .first()
                .map(|option| option.value.clone())
                .unwrap_or_default(),
            constraints: Constraints::default(),
            date_format: None,
            options: Some(options),
            depends_on: None,
            tracking_id: false,
            link: None,
            editable,
            track_role,
            base_name,
        },
    };
    tracing::debug!(
        base_name = %field.base_name,
        field_type = field.field_type.as_str(),
        "built field"
    );
    field
}
