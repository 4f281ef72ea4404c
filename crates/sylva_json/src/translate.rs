//! Translation of draft 4 schemas into tree grammars.
//!
//! The result is a single `main` production. One keyword group is
//! translated per schema, tried in this order: numeric, string, array,
//! object, instance (`enum`, `allOf`, `anyOf`, `oneOf`, `not`). Any
//! `type` is then intersected with that result.
//!
//! Leaf constraints are written `or(not(<type test>), <constraint>)`, so a
//! leaf of another type passes the constraint without ever reaching a
//! typed read.

use std::collections::{BTreeMap, BTreeSet};

use sylva_foundation::{Error, Result, Type};
use sylva_language::{Expr, Grammar, NameExpr, Pattern};
use tracing::debug;

use crate::schema::{Additional, Schema, SimpleType};

/// Translates `schema` into a grammar.
///
/// # Errors
/// Returns `Unsupported` for keywords with no translation: `id`,
/// `default`, `$ref`, `format`, `definitions`, every array keyword,
/// `maxProperties`, `minProperties`, `patternProperties`, `dependencies`,
/// an empty `type` list, and `enum` members that are arrays or objects.
pub fn translate(schema: &Schema) -> Result<Grammar> {
    let top = translate_schema(schema)?;
    let mut nodes = 0usize;
    top.walk(&mut |_| nodes += 1);
    debug!(nodes, "translated schema");
    Ok(Grammar::new(top))
}

fn translate_schema(schema: &Schema) -> Result<Pattern> {
    if schema.ty.as_ref().is_some_and(|set| set.as_slice().is_empty()) {
        return Err(Error::unsupported("an empty list of types"));
    }
    let pattern = translate_keywords(schema)?;
    let guards = schema.types().iter().map(|&ty| type_pattern(ty)).collect();
    Ok(match Pattern::or_all(guards) {
        Some(guard) => Pattern::and(guard, pattern),
        None => pattern,
    })
}

fn translate_keywords(schema: &Schema) -> Result<Pattern> {
    if schema.id.is_some() {
        return Err(unsupported("id"));
    }
    if schema.default.is_some() {
        return Err(unsupported("default"));
    }
    if schema.has_numeric_constraints() {
        return Ok(numeric(schema));
    }
    if schema.has_string_constraints() {
        if schema.types().len() > 1 {
            return Err(Error::unsupported(
                "a list of types together with string constraints",
            ));
        }
        return string(schema);
    }
    if schema.has_array_constraints() {
        return Err(unsupported("array constraints"));
    }
    if schema.has_object_constraints() {
        return object(schema);
    }
    if schema.has_instance_constraints() {
        return instance(schema);
    }
    if schema.reference.is_some() {
        return Err(unsupported("$ref"));
    }
    if schema.format.is_some() {
        return Err(unsupported("format"));
    }
    Ok(Pattern::ZAny)
}

fn unsupported(keyword: &str) -> Error {
    Error::unsupported(format!("JSON-Schema keyword {keyword}"))
}

// =============================================================================
// Types
// =============================================================================

fn type_pattern(ty: SimpleType) -> Pattern {
    match ty {
        // Arrays and objects both stream as labelled children.
        SimpleType::Array | SimpleType::Object => any_children(),
        SimpleType::Boolean => Pattern::leaf(type_of(var(Type::Bool))),
        SimpleType::Integer => Pattern::leaf(type_of(integer())),
        SimpleType::Number => Pattern::leaf(type_of(number())),
        SimpleType::String => Pattern::leaf(type_of(var(Type::String))),
        SimpleType::Null => Pattern::leaf(is_null()),
    }
}

fn any_children() -> Pattern {
    Pattern::zero_or_more(Pattern::tree(NameExpr::AnyName, Pattern::ZAny))
}

fn is_null() -> Expr {
    not(or(
        type_of(number()),
        or(type_of(var(Type::Bool)), type_of(var(Type::String))),
    ))
}

// =============================================================================
// Numbers and strings
// =============================================================================

fn numeric(schema: &Schema) -> Pattern {
    let unless_number = || not(type_of(number()));
    let mut checks = Vec::new();
    if let Some(divisor) = schema.multiple_of {
        let check = call("multipleOf", vec![number(), Expr::literal(divisor)]);
        checks.push(or(unless_number(), check));
    }
    if let Some(max) = schema.maximum {
        let op = if schema.exclusive_maximum { "lt" } else { "le" };
        checks.push(or(unless_number(), call(op, vec![number(), Expr::literal(max)])));
    }
    if let Some(min) = schema.minimum {
        let op = if schema.exclusive_minimum { "gt" } else { "ge" };
        checks.push(or(unless_number(), call(op, vec![number(), Expr::literal(min)])));
    }
    Pattern::leaf(and_all(checks).unwrap_or_else(|| type_of(number())))
}

fn string(schema: &Schema) -> Result<Pattern> {
    let unless_string = || not(type_of(var(Type::String)));
    let mut checks = Vec::new();
    if let Some(max) = schema.max_length {
        let check = call("maxLength", vec![var(Type::String), length(max)?]);
        checks.push(or(unless_string(), check));
    }
    if schema.min_length > 0 {
        let check = call("minLength", vec![var(Type::String), length(schema.min_length)?]);
        checks.push(or(unless_string(), check));
    }
    if let Some(pattern) = &schema.pattern {
        let check = call("regex", vec![Expr::literal(pattern.as_str()), var(Type::String)]);
        checks.push(or(unless_string(), check));
    }
    Ok(Pattern::leaf(
        and_all(checks).unwrap_or_else(|| type_of(var(Type::String))),
    ))
}

fn length(n: u64) -> Result<Expr> {
    i64::try_from(n)
        .map(Expr::literal)
        .map_err(|_| Error::unsupported(format!("string length bound {n}")))
}

// =============================================================================
// Objects
// =============================================================================

fn object(schema: &Schema) -> Result<Pattern> {
    if schema.max_properties.is_some() {
        return Err(unsupported("maxProperties"));
    }
    if schema.min_properties > 0 {
        return Err(unsupported("minProperties"));
    }
    if schema.pattern_properties.as_ref().is_some_and(|p| !p.is_empty()) {
        return Err(unsupported("patternProperties"));
    }
    if schema.dependencies.as_ref().is_some_and(|d| !d.is_empty()) {
        return Err(unsupported("dependencies"));
    }

    let no_properties = BTreeMap::new();
    let properties = schema.properties.as_ref().unwrap_or(&no_properties);
    let required: BTreeSet<&str> = schema
        .required
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();

    // The pattern for members not named in `properties`; None if forbidden.
    let extra = match &schema.additional_properties {
        None | Some(Additional::Allowed(true)) => Some(Pattern::ZAny),
        Some(Additional::Allowed(false)) => None,
        Some(Additional::Schema(sub)) => Some(translate_schema(sub)?),
    };

    let mut members = Vec::with_capacity(properties.len() + 1);
    for (name, sub) in properties {
        let member = Pattern::tree(NameExpr::name(name.as_str()), translate_schema(sub)?);
        members.push(if required.contains(name.as_str()) {
            member
        } else {
            Pattern::optional(member)
        });
    }
    let undeclared: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !properties.contains_key(*name))
        .collect();
    for &name in &undeclared {
        members.push(match &extra {
            Some(child) => Pattern::tree(NameExpr::name(name), child.clone()),
            None => Pattern::not(Pattern::ZAny),
        });
    }

    let named = properties.keys().map(String::as_str).chain(undeclared.iter().copied());
    let others = match name_choice(named) {
        Some(choice) => NameExpr::except(choice),
        None => NameExpr::AnyName,
    };
    members.push(match extra {
        None => Pattern::Empty,
        Some(child) => Pattern::zero_or_more(Pattern::tree(others, child)),
    });

    Ok(Pattern::interleave_all(members).unwrap_or(Pattern::ZAny))
}

fn name_choice<'a>(names: impl Iterator<Item = &'a str>) -> Option<NameExpr> {
    let names: Vec<NameExpr> = names.map(NameExpr::name).collect();
    let mut iter = names.into_iter().rev();
    let last = iter.next()?;
    Some(iter.fold(last, |acc, n| NameExpr::choice(n, acc)))
}

// =============================================================================
// Instance keywords
// =============================================================================

fn instance(schema: &Schema) -> Result<Pattern> {
    if schema.definitions.as_ref().is_some_and(|d| !d.is_empty()) {
        return Err(unsupported("definitions"));
    }
    if let Some(values) = listed(&schema.enumeration, "enum")? {
        let leaves = values
            .iter()
            .map(|v| enum_member(v).map(Pattern::leaf))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Pattern::or_all(leaves).unwrap_or(Pattern::ZAny));
    }
    if let Some(schemas) = listed(&schema.all_of, "allOf")? {
        return Ok(Pattern::and_all(translate_each(schemas)?).unwrap_or(Pattern::ZAny));
    }
    if let Some(schemas) = listed(&schema.any_of, "anyOf")? {
        return Ok(Pattern::or_all(translate_each(schemas)?).unwrap_or(Pattern::ZAny));
    }
    if let Some(schemas) = listed(&schema.one_of, "oneOf")? {
        return Ok(exactly_one(translate_each(schemas)?));
    }
    if let Some(sub) = &schema.not {
        return Ok(Pattern::not(translate_schema(sub)?));
    }
    Ok(Pattern::ZAny)
}

/// The members of an array keyword, which must not be empty when present.
fn listed<'a, T>(list: &'a Option<Vec<T>>, keyword: &str) -> Result<Option<&'a [T]>> {
    match list.as_deref() {
        Some([]) => Err(Error::unsupported(format!("an empty {keyword} list"))),
        other => Ok(other),
    }
}

fn translate_each(schemas: &[Schema]) -> Result<Vec<Pattern>> {
    schemas.iter().map(translate_schema).collect()
}

/// `Or` over each `p_i` intersected with the complement of all others.
fn exactly_one(patterns: Vec<Pattern>) -> Pattern {
    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap_or(Pattern::ZAny);
    }
    let alternatives = (0..patterns.len())
        .map(|i| {
            let others = patterns
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, p)| p.clone())
                .collect();
            let others = Pattern::or_all(others).unwrap_or_else(|| Pattern::not(Pattern::ZAny));
            Pattern::and(patterns[i].clone(), Pattern::not(others))
        })
        .collect();
    Pattern::or_all(alternatives).unwrap_or(Pattern::ZAny)
}

fn enum_member(value: &serde_json::Value) -> Result<Expr> {
    use serde_json::Value as Json;
    Ok(match value {
        Json::Null => is_null(),
        Json::Bool(b) => and(
            type_of(var(Type::Bool)),
            call("eq", vec![var(Type::Bool), Expr::literal(*b)]),
        ),
        Json::Number(n) => {
            let n = n
                .as_f64()
                .ok_or_else(|| Error::unsupported(format!("enum member {n}")))?;
            and(type_of(number()), call("eq", vec![number(), Expr::literal(n)]))
        }
        Json::String(s) => and(
            type_of(var(Type::String)),
            call("eq", vec![var(Type::String), Expr::literal(s.as_str())]),
        ),
        Json::Array(_) | Json::Object(_) => {
            return Err(unsupported("enum with array or object members"));
        }
    })
}

// =============================================================================
// Expression helpers
// =============================================================================

fn call(name: &str, params: Vec<Expr>) -> Expr {
    Expr::call(name, params)
}

fn var(ty: Type) -> Expr {
    Expr::var(ty)
}

fn number() -> Expr {
    call("number", vec![])
}

fn integer() -> Expr {
    call("integer", vec![])
}

fn type_of(e: Expr) -> Expr {
    call("type", vec![e])
}

fn not(e: Expr) -> Expr {
    call("not", vec![e])
}

fn or(a: Expr, b: Expr) -> Expr {
    call("or", vec![a, b])
}

fn and(a: Expr, b: Expr) -> Expr {
    call("and", vec![a, b])
}

fn and_all(exprs: Vec<Expr>) -> Option<Expr> {
    let mut iter = exprs.into_iter().rev();
    let last = iter.next()?;
    Some(iter.fold(last, |acc, e| and(e, acc)))
}
