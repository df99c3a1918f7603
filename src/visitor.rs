//! The schema visitor: recursive-descent dispatch from schema shapes to
//! grammar rules.
//!
//! A schema node is classified once into a `SchemaShape` (the dispatch
//! branches are mutually exclusive by construction, first match wins), then
//! the matching strategy emits a rule into the shared `RuleTable` and
//! returns its name. All mutable state lives on the `Compiler` context
//! threaded through the recursion.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{GrammarError, Result};
use crate::exclude;
use crate::intrange::{MAX_RANGE_DIGITS, generate_min_max_int};
use crate::primitives::{BuiltinRule, PRIMITIVE_RULES, STRING_FORMAT_RULES};
use crate::repeat::build_repetition;
use crate::resolver;
use crate::rules::{RuleTable, escape_name, is_reserved};

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS & ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Property names to emit first, in this order; unlisted properties keep
    /// their declaration order after them.
    pub prop_order: Vec<String>,
    /// `.` in patterns matches any code point instead of any
    /// non-line-break character.
    pub dotall: bool,
}

/// Compile a JSON Schema into grammar text.
pub fn compile(schema: &Value, options: &CompileOptions) -> Result<String> {
    let mut compiler = Compiler::new(options.clone());
    compiler.resolve_refs(schema)?;
    compiler.visit(schema, "")?;
    Ok(compiler.format_grammar())
}

/// Parse schema text, then compile it.
pub fn compile_str(schema: &str, options: &CompileOptions) -> Result<String> {
    let value: Value = serde_json::from_str(schema)?;
    compile(&value, options)
}

// ————————————————————————————————————————————————————————————————————————————
// SHAPE CLASSIFICATION
// ————————————————————————————————————————————————————————————————————————————

/// The visitor's dispatch alternatives, computed up front. Order of the
/// `classify` checks is load-bearing: schemas may satisfy several shapes and
/// the first match wins.
#[derive(Debug)]
enum SchemaShape<'a> {
    Ref(&'a str),
    Union(&'a Vec<Value>),
    TypeList(&'a Vec<Value>),
    Const(&'a Value),
    Enum(&'a Vec<Value>),
    ObjectProps,
    AllOf(&'a Vec<Value>),
    ArrayItems,
    Pattern(&'a str),
    Uuid(&'a str),
    FormatString(String),
    LengthBoundedString,
    RangedInteger,
    AnyObject,
    Primitive(&'a str),
    Unrecognized,
}

fn classify(map: &Map<String, Value>) -> SchemaShape<'_> {
    let schema_type = map.get("type").and_then(|v| v.as_str());
    let schema_format = map.get("format").and_then(|v| v.as_str());
    let typed = |t: &str| schema_type.is_none() || schema_type == Some(t);

    if let Some(Value::String(r)) = map.get("$ref") {
        return SchemaShape::Ref(r);
    }
    if let Some(Value::Array(alts)) = map.get("oneOf").or_else(|| map.get("anyOf")) {
        return SchemaShape::Union(alts);
    }
    if let Some(Value::Array(types)) = map.get("type") {
        return SchemaShape::TypeList(types);
    }
    if let Some(value) = map.get("const") {
        return SchemaShape::Const(value);
    }
    if let Some(Value::Array(values)) = map.get("enum") {
        return SchemaShape::Enum(values);
    }
    if typed("object")
        && (map.contains_key("properties")
            || map
                .get("additionalProperties")
                .is_some_and(|v| v != &Value::Bool(true)))
    {
        return SchemaShape::ObjectProps;
    }
    if let Some(Value::Array(branches)) = map.get("allOf") {
        if typed("object") || schema_type == Some("string") {
            return SchemaShape::AllOf(branches);
        }
    }
    if typed("array") && (map.contains_key("items") || map.contains_key("prefixItems")) {
        return SchemaShape::ArrayItems;
    }
    if typed("string") {
        if let Some(Value::String(pattern)) = map.get("pattern") {
            return SchemaShape::Pattern(pattern);
        }
        if let Some(fmt) = schema_format {
            if is_uuid_format(fmt) {
                return SchemaShape::Uuid(fmt);
            }
            let wrapper = format!("{fmt}-string");
            if STRING_FORMAT_RULES.contains_key(wrapper.as_str()) {
                return SchemaShape::FormatString(wrapper);
            }
        }
    }
    if typed("string") && (map.contains_key("minLength") || map.contains_key("maxLength")) {
        return SchemaShape::LengthBoundedString;
    }
    if typed("integer")
        && ["minimum", "exclusiveMinimum", "maximum", "exclusiveMaximum"]
            .iter()
            .any(|&k| map.contains_key(k))
    {
        return SchemaShape::RangedInteger;
    }
    if schema_type == Some("object") || map.is_empty() {
        return SchemaShape::AnyObject;
    }
    match schema_type {
        Some(t) if PRIMITIVE_RULES.contains_key(t) => SchemaShape::Primitive(t),
        _ => SchemaShape::Unrecognized,
    }
}

fn is_uuid_format(fmt: &str) -> bool {
    match fmt.strip_prefix("uuid") {
        Some("") => true,
        Some(rest) => rest.len() == 1 && matches!(rest.as_bytes()[0], b'1'..=b'5'),
        None => false,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILER CONTEXT
// ————————————————————————————————————————————————————————————————————————————

pub struct Compiler {
    pub(crate) rules: RuleTable,
    refs: BTreeMap<String, Value>,
    resolving: BTreeSet<String>,
    pub(crate) options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            rules: RuleTable::new(),
            refs: BTreeMap::new(),
            resolving: BTreeSet::new(),
            options,
        }
    }

    /// Pre-resolve every `$ref` in `schema`. Must run once, before `visit`,
    /// over the same schema value.
    pub fn resolve_refs(&mut self, schema: &Value) -> Result<()> {
        self.refs = resolver::resolve_refs(schema)?;
        Ok(())
    }

    pub fn format_grammar(&self) -> String {
        self.rules.format_grammar()
    }

    fn primitive(&self, name: &str) -> Result<&'static BuiltinRule> {
        crate::primitives::lookup(name).ok_or_else(|| GrammarError::Catalog(name.to_string()))
    }

    /// Visit a schema node under a name hint, returning the registered rule
    /// name. The empty hint names the grammar root.
    pub fn visit(&mut self, schema: &Value, name: &str) -> Result<String> {
        let rule_name = if is_reserved(name) {
            format!("{name}-")
        } else if name.is_empty() {
            "root".to_string()
        } else {
            name.to_string()
        };

        let Some(map) = schema.as_object() else {
            return Err(GrammarError::UnrecognizedSchema(schema.to_string()));
        };

        match classify(map) {
            SchemaShape::Ref(r) => {
                let target = self.resolve_ref_rule(r)?;
                Ok(self.rules.add_rule(&rule_name, &target))
            }
            SchemaShape::Union(alts) => {
                let body = self.union_rule(name, alts)?;
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::TypeList(types) => {
                let alts: Vec<Value> = types
                    .iter()
                    .map(|t| {
                        let mut sub = map.clone();
                        sub.insert("type".to_string(), t.clone());
                        Value::Object(sub)
                    })
                    .collect();
                let body = self.union_rule(name, &alts)?;
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::Const(value) => {
                let body = format!("{} space", constant_rule(value)?);
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::Enum(values) => {
                let lits = values
                    .iter()
                    .map(constant_rule)
                    .collect::<Result<Vec<_>>>()?;
                let body = format!("({}) space", lits.join(" | "));
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::ObjectProps => {
                let required: BTreeSet<String> = map
                    .get("required")
                    .and_then(|v| v.as_array())
                    .map(|a| {
                        a.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                let properties: Vec<(String, Value)> = map
                    .get("properties")
                    .and_then(|v| v.as_object())
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                let additional = map.get("additionalProperties").cloned();
                let body =
                    self.build_object_rule(&properties, &required, name, additional.as_ref())?;
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::AllOf(branches) => {
                let branches = branches.clone();
                self.visit_all_of(&branches, name, &rule_name)
            }
            SchemaShape::ArrayItems => self.visit_array(map, name, &rule_name),
            SchemaShape::Pattern(pattern) => {
                let pattern = pattern.to_string();
                self.visit_pattern(&pattern, &rule_name)
            }
            SchemaShape::Uuid(fmt) => {
                let reg = if rule_name == "root" { "root" } else { fmt };
                self.rules.add_primitive(reg, self.primitive("uuid")?)
            }
            SchemaShape::FormatString(wrapper) => {
                let prim = self.primitive(&wrapper)?;
                let reg = self.rules.add_primitive(&wrapper, prim)?;
                Ok(self.rules.add_rule(&rule_name, &reg))
            }
            SchemaShape::LengthBoundedString => {
                let char_rule = self.rules.add_primitive("char", self.primitive("char")?)?;
                let min = map.get("minLength").and_then(|v| v.as_u64()).unwrap_or(0);
                let max = map.get("maxLength").and_then(|v| v.as_u64());
                let body = format!(
                    "\"\\\"\" {} \"\\\"\" space",
                    build_repetition(&char_rule, min, max, None)
                );
                Ok(self.rules.add_rule(&rule_name, &body))
            }
            SchemaShape::RangedInteger => {
                // bounds the range generator cannot negate (i64::MIN) or
                // shift past the i64 edge are dropped, not wrapped
                let min_value = map
                    .get("minimum")
                    .and_then(|v| v.as_i64())
                    .or_else(|| {
                        map.get("exclusiveMinimum")
                            .and_then(|v| v.as_i64())
                            .and_then(|v| v.checked_add(1))
                    })
                    .filter(|v| v.checked_neg().is_some());
                let max_value = map
                    .get("maximum")
                    .and_then(|v| v.as_i64())
                    .or_else(|| {
                        map.get("exclusiveMaximum")
                            .and_then(|v| v.as_i64())
                            .and_then(|v| v.checked_sub(1))
                    })
                    .filter(|v| v.checked_neg().is_some());
                if min_value.is_none() && max_value.is_none() {
                    // bounds present but not integral (or unusable): plain integer
                    let reg_name = if rule_name == "root" { "root" } else { "integer" };
                    return self.rules.add_primitive(reg_name, self.primitive("integer")?);
                }
                let mut out = String::from("(");
                generate_min_max_int(min_value, max_value, &mut out, MAX_RANGE_DIGITS, true);
                out.push_str(") space");
                Ok(self.rules.add_rule(&rule_name, &out))
            }
            SchemaShape::AnyObject => {
                let reg = if rule_name == "root" { "root" } else { "object" };
                self.rules.add_primitive(reg, self.primitive("object")?)
            }
            SchemaShape::Primitive(t) => {
                let prim = self.primitive(t)?;
                let reg = if rule_name == "root" { "root" } else { t };
                self.rules.add_primitive(reg, prim)
            }
            SchemaShape::Unrecognized => {
                Err(GrammarError::UnrecognizedSchema(schema.to_string()))
            }
        }
    }

    /// `$ref` case: reuse an already-registered rule, or visit the resolved
    /// target under the pointer's last segment. The `resolving` set is the
    /// recursion breakpoint for cyclic schemas — a ref already mid-visit
    /// resolves to its (in-progress) rule name instead of descending again.
    fn resolve_ref_rule(&mut self, r: &str) -> Result<String> {
        let mut ref_name = r.rsplit('/').next().unwrap_or(r).to_string();
        if !self.rules.contains(&escape_name(&ref_name)) && !self.resolving.contains(r) {
            self.resolving.insert(r.to_string());
            let resolved = self
                .refs
                .get(r)
                .cloned()
                .ok_or_else(|| GrammarError::UnsupportedRef(r.to_string()))?;
            let visited = self.visit(&resolved, &ref_name);
            self.resolving.remove(r);
            ref_name = visited?;
        } else {
            ref_name = escape_name(&ref_name);
        }
        Ok(ref_name)
    }

    fn union_rule(&mut self, name: &str, alts: &[Value]) -> Result<String> {
        let mut parts = Vec::with_capacity(alts.len());
        for (i, alt) in alts.iter().enumerate() {
            let alt_name = if name.is_empty() {
                format!("alternative-{i}")
            } else {
                format!("{name}-{i}")
            };
            parts.push(self.visit(alt, &alt_name)?);
        }
        Ok(parts.join(" | "))
    }

    // ———————————————————————————— allOf ————————————————————————————————————

    /// Merge branch properties (direct branches required, `anyOf`
    /// sub-branches optional). When every branch is a bare literal
    /// constraint, intersect the literal sets and emit an enum instead.
    fn visit_all_of(&mut self, branches: &[Value], name: &str, rule_name: &str) -> Result<String> {
        let mut properties: Vec<(String, Value)> = Vec::new();
        let mut required: BTreeSet<String> = BTreeSet::new();
        let mut literal_sets: Vec<Vec<String>> = Vec::new();
        let mut saw_non_literal = false;

        for branch in branches {
            if let Some(any_of) = branch.get("anyOf").and_then(|v| v.as_array()) {
                for sub in any_of {
                    self.merge_component(sub, false, &mut properties, &mut required)?;
                }
                saw_non_literal = true;
            } else {
                let comp = self.deref_component(branch)?.clone();
                match literal_set(&comp)? {
                    Some(lits) => literal_sets.push(lits),
                    None => {
                        self.merge_component(&comp, true, &mut properties, &mut required)?;
                        saw_non_literal = true;
                    }
                }
            }
        }

        if !saw_non_literal && !literal_sets.is_empty() {
            let mut common = literal_sets[0].clone();
            for set in &literal_sets[1..] {
                common.retain(|lit| set.contains(lit));
            }
            if common.is_empty() {
                return Err(GrammarError::UnrecognizedSchema(format!(
                    "allOf branches share no common literal: {}",
                    Value::Array(branches.to_vec())
                )));
            }
            let lits: Vec<String> = common.iter().map(|l| format_literal(l)).collect();
            let body = format!("({}) space", lits.join(" | "));
            return Ok(self.rules.add_rule(rule_name, &body));
        }

        let body = self.build_object_rule(&properties, &required, name, None)?;
        Ok(self.rules.add_rule(rule_name, &body))
    }

    fn deref_component<'a>(&'a self, comp: &'a Value) -> Result<&'a Value> {
        if let Some(Value::String(r)) = comp.as_object().and_then(|m| m.get("$ref")) {
            return self
                .refs
                .get(r)
                .ok_or_else(|| GrammarError::UnsupportedRef(r.clone()));
        }
        Ok(comp)
    }

    fn merge_component(
        &self,
        comp: &Value,
        is_required: bool,
        properties: &mut Vec<(String, Value)>,
        required: &mut BTreeSet<String>,
    ) -> Result<()> {
        let comp = self.deref_component(comp)?;
        if let Some(props) = comp.get("properties").and_then(|v| v.as_object()) {
            for (prop_name, prop_schema) in props {
                properties.push((prop_name.clone(), prop_schema.clone()));
                if is_required {
                    required.insert(prop_name.clone());
                }
            }
        }
        Ok(())
    }

    // ———————————————————————————— arrays ———————————————————————————————————

    fn visit_array(
        &mut self,
        map: &Map<String, Value>,
        name: &str,
        rule_name: &str,
    ) -> Result<String> {
        let sep = if name.is_empty() { "" } else { "-" };
        let items = map
            .get("items")
            .filter(|v| !v.is_null())
            .or_else(|| map.get("prefixItems"));
        let Some(items) = items else {
            return Err(GrammarError::UnrecognizedSchema(Value::Object(map.clone()).to_string()));
        };

        if let Some(tuple) = items.as_array() {
            // fixed-arity tuple, comma-joined
            let mut parts = Vec::with_capacity(tuple.len());
            for (i, item) in tuple.iter().enumerate() {
                parts.push(self.visit(item, &format!("{name}{sep}tuple-{i}"))?);
            }
            let body = format!("\"[\" space {} \"]\" space", parts.join(" \",\" space "));
            return Ok(self.rules.add_rule(rule_name, &body));
        }

        let item_rule = self.visit(items, &format!("{name}{sep}item"))?;
        let min_items = map.get("minItems").and_then(|v| v.as_u64()).unwrap_or(0);
        let max_items = map.get("maxItems").and_then(|v| v.as_u64());
        let body = if max_items == Some(0) {
            "\"[\" space \"]\" space".to_string()
        } else {
            format!(
                "\"[\" space {} \"]\" space",
                build_repetition(&item_rule, min_items, max_items, Some("\",\" space"))
            )
        };
        Ok(self.rules.add_rule(rule_name, &body))
    }

    // ———————————————————————————— objects ——————————————————————————————————

    /// Required properties form a fixed comma-joined prefix; optional ones a
    /// recursive suffix accepting any order-preserving subset. A truthy
    /// `additionalProperties` contributes a repeatable `*` pseudo-key whose
    /// key rule excludes the declared property names.
    fn build_object_rule(
        &mut self,
        properties: &[(String, Value)],
        required: &BTreeSet<String>,
        name: &str,
        additional: Option<&Value>,
    ) -> Result<String> {
        let sep = if name.is_empty() { "" } else { "-" };
        let prop_order = &self.options.prop_order;
        let order_of = |p: &str| {
            prop_order
                .iter()
                .position(|x| x == p)
                .unwrap_or(prop_order.len())
        };
        let mut sorted_props: Vec<String> =
            properties.iter().map(|(k, _)| k.clone()).collect();
        sorted_props.sort_by_key(|k| order_of(k)); // stable: ties keep declaration order

        let mut prop_kv_rule_names: IndexMap<String, String> = IndexMap::new();
        for (prop_name, prop_schema) in properties {
            let prop_rule_name = self.visit(prop_schema, &format!("{name}{sep}{prop_name}"))?;
            let kv_body = format!(
                "{} space \":\" space {}",
                format_literal(&serde_json::to_string(prop_name)?),
                prop_rule_name
            );
            let kv_name = self
                .rules
                .add_rule(&format!("{name}{sep}{prop_name}-kv"), &kv_body);
            prop_kv_rule_names.insert(prop_name.clone(), kv_name);
        }

        let required_props: Vec<String> = sorted_props
            .iter()
            .filter(|k| required.contains(k.as_str()))
            .cloned()
            .collect();
        let mut optional_props: Vec<String> = sorted_props
            .iter()
            .filter(|k| !required.contains(k.as_str()))
            .cloned()
            .collect();

        if let Some(additional) = additional {
            if !additional.is_null() && additional != &Value::Bool(false) {
                let sub_name = format!("{name}{sep}additional");
                let value_rule = if additional.is_object() {
                    self.visit(additional, &format!("{sub_name}-value"))?
                } else {
                    self.rules.add_primitive("value", self.primitive("value")?)?
                };
                let key_rule = if sorted_props.is_empty() {
                    self.rules.add_primitive("string", self.primitive("string")?)?
                } else {
                    let names: Vec<&str> = sorted_props.iter().map(String::as_str).collect();
                    let body = exclude::not_strings(&mut self.rules, &names)?;
                    self.rules.add_rule(&format!("{sub_name}-k"), &body)
                };
                let kv_name = self.rules.add_rule(
                    &format!("{sub_name}-kv"),
                    &format!("{key_rule} \":\" space {value_rule}"),
                );
                prop_kv_rule_names.insert("*".to_string(), kv_name);
                optional_props.push("*".to_string());
            }
        }

        let mut rule = String::from("\"{\" space ");
        rule.push_str(
            &required_props
                .iter()
                .map(|k| prop_kv_rule_names[k].clone())
                .collect::<Vec<_>>()
                .join(" \",\" space "),
        );

        if !optional_props.is_empty() {
            rule.push_str(" (");
            if !required_props.is_empty() {
                rule.push_str(" \",\" space ( ");
            }
            let mut alts = Vec::with_capacity(optional_props.len());
            for i in 0..optional_props.len() {
                alts.push(self.optional_suffix(
                    &optional_props[i..],
                    &prop_kv_rule_names,
                    name,
                    false,
                )?);
            }
            rule.push_str(&alts.join(" | "));
            if !required_props.is_empty() {
                rule.push_str(" )");
            }
            rule.push_str(" )?");
        }

        rule.push_str(" \"}\" space");
        Ok(rule)
    }

    /// For optional key `i`: optionally a comma and its pair, optionally
    /// followed by the same construction over keys `i+1..`. The `*`
    /// pseudo-key repeats instead of appearing at most once.
    fn optional_suffix(
        &mut self,
        keys: &[String],
        kv_names: &IndexMap<String, String>,
        name: &str,
        first_is_optional: bool,
    ) -> Result<String> {
        let sep = if name.is_empty() { "" } else { "-" };
        let k = &keys[0];
        let kv_rule_name = &kv_names[k];
        let comma_ref = format!("( \",\" space {kv_rule_name} )");
        let mut res = if first_is_optional {
            format!("{comma_ref}{}", if k == "*" { "*" } else { "?" })
        } else if k == "*" {
            format!("{kv_rule_name} {comma_ref}*")
        } else {
            kv_rule_name.clone()
        };
        if keys.len() > 1 {
            let rest = self.optional_suffix(&keys[1..], kv_names, name, true)?;
            let rest_name = self.rules.add_rule(&format!("{name}{sep}{k}-rest"), &rest);
            res.push(' ');
            res.push_str(&rest_name);
        }
        Ok(res)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LITERAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Quote a text as a grammar literal. The input is typically already
/// JSON-serialized, so its backslash escapes double as grammar escapes; only
/// quotes and raw line breaks need rewriting.
pub(crate) fn format_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A `const`/`enum` member: the JSON-serialized literal as a quoted
/// grammar fragment.
fn constant_rule(value: &Value) -> Result<String> {
    Ok(format_literal(&serde_json::to_string(value)?))
}

/// A branch's literal constraint (its `enum` members or single `const`),
/// JSON-serialized; `None` when the branch is not a bare literal constraint.
fn literal_set(comp: &Value) -> Result<Option<Vec<String>>> {
    let Some(map) = comp.as_object() else {
        return Ok(None);
    };
    if map.contains_key("properties") {
        return Ok(None);
    }
    if let Some(Value::Array(values)) = map.get("enum") {
        let lits = values
            .iter()
            .map(|v| serde_json::to_string(v).map_err(GrammarError::from))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(lits));
    }
    if let Some(value) = map.get("const") {
        return Ok(Some(vec![serde_json::to_string(value)?]));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbnf::Grammar;
    use serde_json::json;

    fn compile_text(schema: Value) -> String {
        compile(&schema, &CompileOptions::default()).unwrap()
    }

    fn grammar_for(schema: Value) -> Grammar {
        Grammar::parse(&compile_text(schema)).unwrap()
    }

    #[test]
    fn boolean_root() {
        let text = compile_text(json!({ "type": "boolean" }));
        assert_eq!(
            text,
            "root ::= (\"true\" | \"false\") space\nspace ::= \" \"?\n"
        );
        let g = Grammar::parse(&text).unwrap();
        assert!(g.accepts("true"));
        assert!(g.accepts("false"));
        assert!(!g.accepts("maybe"));
    }

    #[test]
    fn bare_string_and_null_roots() {
        let g = grammar_for(json!({ "type": "string" }));
        assert!(g.accepts("\"hello\""));
        assert!(!g.accepts("hello"));

        let g = grammar_for(json!({ "type": "null" }));
        assert!(g.accepts("null"));
    }

    #[test]
    fn required_only_object_accepts_one_key_ordering() {
        let g = grammar_for(json!({
            "type": "object",
            "properties": { "a": { "type": "integer" }, "b": { "type": "string" } },
            "required": ["a", "b"],
            "additionalProperties": false
        }));
        assert!(g.accepts("{\"a\": 1, \"b\": \"x\"}"));
        assert!(!g.accepts("{\"b\": \"x\", \"a\": 1}"));
        assert!(!g.accepts("{\"a\": 1}"));
        assert!(!g.accepts("{\"a\": 1, \"b\": \"x\", \"c\": 2}"));
    }

    #[test]
    fn optional_properties_accept_in_order_subsets() {
        let g = grammar_for(json!({
            "type": "object",
            "properties": { "a": { "type": "integer" }, "b": { "type": "string" } }
        }));
        assert!(g.accepts("{}"));
        assert!(g.accepts("{\"a\": 1}"));
        assert!(g.accepts("{\"b\": \"x\"}"));
        assert!(g.accepts("{\"a\": 1, \"b\": \"x\"}"));
        // subsets keep declaration order
        assert!(!g.accepts("{\"b\": \"x\", \"a\": 1}"));
    }

    #[test]
    fn prop_order_overrides_declaration_order() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "type": "integer" }, "b": { "type": "integer" } },
            "required": ["a", "b"]
        });
        let options = CompileOptions {
            prop_order: vec!["b".to_string()],
            ..Default::default()
        };
        let g = Grammar::parse(&compile(&schema, &options).unwrap()).unwrap();
        assert!(g.accepts("{\"b\": 1, \"a\": 2}"));
        assert!(!g.accepts("{\"a\": 2, \"b\": 1}"));
    }

    #[test]
    fn required_reordering_does_not_change_grammar() {
        let base = json!({
            "type": "object",
            "properties": { "a": { "type": "integer" }, "b": { "type": "integer" } },
            "required": ["a", "b"]
        });
        let swapped = json!({
            "type": "object",
            "properties": { "a": { "type": "integer" }, "b": { "type": "integer" } },
            "required": ["b", "a"]
        });
        assert_eq!(compile_text(base), compile_text(swapped));
    }

    #[test]
    fn status_enum_scenario() {
        let g = grammar_for(json!({
            "type": "object",
            "properties": { "status": { "enum": ["a", "b"] } },
            "required": ["status"]
        }));
        assert!(g.accepts("{\"status\": \"a\"}"));
        assert!(g.accepts("{\"status\": \"b\"}"));
        assert!(!g.accepts("{\"status\": \"c\"}"));
        assert!(!g.accepts("{\"other\": \"a\"}"));
        assert!(!g.accepts("{}"));
    }

    #[test]
    fn const_is_a_single_literal() {
        let g = grammar_for(json!({ "const": 42 }));
        assert!(g.accepts("42"));
        assert!(!g.accepts("43"));
    }

    #[test]
    fn array_min_max_items_scenario() {
        let g = grammar_for(json!({
            "type": "array",
            "items": { "type": "string" },
            "minItems": 1,
            "maxItems": 2
        }));
        assert!(g.accepts("[\"x\"]"));
        assert!(g.accepts("[\"x\", \"y\"]"));
        assert!(!g.accepts("[]"));
        assert!(!g.accepts("[\"x\", \"y\", \"z\"]"));
    }

    #[test]
    fn zero_max_items_is_the_empty_array() {
        let g = grammar_for(json!({
            "type": "array",
            "items": { "type": "integer" },
            "maxItems": 0
        }));
        assert!(g.accepts("[]"));
        assert!(!g.accepts("[1]"));
    }

    #[test]
    fn tuple_arrays_are_positional() {
        let g = grammar_for(json!({
            "type": "array",
            "prefixItems": [{ "type": "string" }, { "type": "integer" }]
        }));
        assert!(g.accepts("[\"x\", 1]"));
        assert!(!g.accepts("[1, \"x\"]"));
        assert!(!g.accepts("[\"x\"]"));
    }

    #[test]
    fn integer_range_scenario() {
        let g = grammar_for(json!({
            "type": "integer",
            "minimum": 1,
            "maximum": 300
        }));
        for ok in ["1", "9", "42", "100", "299", "300"] {
            assert!(g.accepts(ok), "should accept {ok}");
        }
        for bad in ["0", "301", "-1", "05", "1000"] {
            assert!(!g.accepts(bad), "should reject {bad}");
        }
    }

    #[test]
    fn exclusive_bounds_shift_by_one() {
        let g = grammar_for(json!({
            "type": "integer",
            "exclusiveMinimum": 0,
            "exclusiveMaximum": 3
        }));
        assert!(g.accepts("1"));
        assert!(g.accepts("2"));
        assert!(!g.accepts("0"));
        assert!(!g.accepts("3"));
    }

    #[test]
    fn exclusive_bound_at_the_i64_edge_degrades_to_plain_integer() {
        let g = grammar_for(json!({
            "type": "integer",
            "exclusiveMinimum": i64::MAX
        }));
        assert!(g.accepts("12"));
        assert!(g.accepts("-3"));
    }

    #[test]
    fn minimum_at_i64_min_keeps_only_the_upper_bound() {
        let g = grammar_for(json!({
            "type": "integer",
            "minimum": i64::MIN,
            "maximum": 5
        }));
        assert!(g.accepts("5"));
        assert!(g.accepts("-9999"));
        assert!(!g.accepts("6"));
    }

    #[test]
    fn union_of_string_and_null() {
        let g = grammar_for(json!({
            "oneOf": [{ "type": "string" }, { "type": "null" }]
        }));
        assert!(g.accepts("\"x\""));
        assert!(g.accepts("null"));
        assert!(!g.accepts("1"));
    }

    #[test]
    fn type_list_expands_to_a_union() {
        let g = grammar_for(json!({ "type": ["integer", "null"] }));
        assert!(g.accepts("7"));
        assert!(g.accepts("null"));
        assert!(!g.accepts("\"7\""));
    }

    #[test]
    fn ref_cycle_compiles_to_finite_rules() {
        let text = compile_text(json!({
            "$defs": { "node": {
                "type": "object",
                "properties": { "next": { "$ref": "#/$defs/node" } }
            }},
            "$ref": "#/$defs/node"
        }));
        assert!(text.contains("node ::="));
        let g = Grammar::parse(&text).unwrap();
        assert!(g.accepts("{}"));
        assert!(g.accepts("{\"next\": {}}"));
        assert!(g.accepts("{\"next\": {\"next\": {}}}"));
        assert!(!g.accepts("{\"next\": 1}"));
    }

    #[test]
    fn additional_properties_key_rule_excludes_declared_names() {
        let g = grammar_for(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer" }
            },
            "additionalProperties": true
        }));
        assert!(g.rule_accepts("additional-k", "\"email\""));
        assert!(g.rule_accepts("additional-k", "\"names\""));
        assert!(!g.rule_accepts("additional-k", "\"name\""));
        assert!(!g.rule_accepts("additional-k", "\"age\""));
        // the pseudo-key repeats
        assert!(g.accepts("{\"name\": \"n\", \"x\": 1, \"y\": 2}"));
        assert!(!g.accepts("{\"name\": \"n\", \"name\": \"again\"}"));
    }

    #[test]
    fn additional_properties_schema_constrains_extra_values() {
        let g = grammar_for(json!({
            "type": "object",
            "additionalProperties": { "type": "integer" }
        }));
        assert!(g.accepts("{}"));
        assert!(g.accepts("{\"x\": 1}"));
        assert!(!g.accepts("{\"x\": \"one\"}"));
    }

    #[test]
    fn all_of_merges_branch_properties() {
        let g = grammar_for(json!({
            "allOf": [
                { "properties": { "a": { "type": "string" } } },
                { "properties": { "b": { "type": "integer" } } }
            ]
        }));
        assert!(g.accepts("{\"a\": \"x\", \"b\": 1}"));
        assert!(!g.accepts("{\"a\": \"x\"}"));
        assert!(!g.accepts("{\"b\": 1, \"a\": \"x\"}"));
    }

    #[test]
    fn all_of_any_of_branches_stay_optional() {
        let g = grammar_for(json!({
            "allOf": [
                { "properties": { "a": { "type": "integer" } } },
                { "anyOf": [
                    { "properties": { "b": { "type": "integer" } } },
                    { "properties": { "c": { "type": "integer" } } }
                ] }
            ]
        }));
        assert!(g.accepts("{\"a\": 1}"));
        assert!(g.accepts("{\"a\": 1, \"b\": 2}"));
        assert!(g.accepts("{\"a\": 1, \"b\": 2, \"c\": 3}"));
    }

    #[test]
    fn all_of_literals_intersect() {
        let g = grammar_for(json!({
            "allOf": [
                { "enum": [1, 2, 3] },
                { "enum": [2, 3, 4] }
            ]
        }));
        assert!(g.accepts("2"));
        assert!(g.accepts("3"));
        assert!(!g.accepts("1"));
        assert!(!g.accepts("4"));
    }

    #[test]
    fn all_of_disjoint_literals_is_an_error() {
        let err = compile(
            &json!({ "allOf": [{ "const": 1 }, { "const": 2 }] }),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GrammarError::UnrecognizedSchema(_)));
    }

    #[test]
    fn length_bounded_string() {
        let g = grammar_for(json!({
            "type": "string",
            "minLength": 2,
            "maxLength": 3
        }));
        assert!(g.accepts("\"ab\""));
        assert!(g.accepts("\"abc\""));
        assert!(!g.accepts("\"a\""));
        assert!(!g.accepts("\"abcd\""));
    }

    #[test]
    fn length_bounds_without_an_explicit_type() {
        let g = grammar_for(json!({ "minLength": 2, "maxLength": 3 }));
        assert!(g.accepts("\"ab\""));
        assert!(!g.accepts("\"a\""));
    }

    #[test]
    fn pattern_schema_end_to_end() {
        let g = grammar_for(json!({
            "type": "string",
            "pattern": "^[ab]+$"
        }));
        assert!(g.accepts("\"ab\""));
        assert!(g.accepts("\"bbba\""));
        assert!(!g.accepts("\"c\""));
        assert!(!g.accepts("ab"));
    }

    #[test]
    fn date_time_format_pulls_in_dependencies() {
        let text = compile_text(json!({ "type": "string", "format": "date-time" }));
        assert!(text.contains("date ::="));
        assert!(text.contains("time ::="));
        let g = Grammar::parse(&text).unwrap();
        assert!(g.accepts("\"2024-01-15T10:30:00Z\""));
        assert!(!g.accepts("\"2024-13-15T10:30:00Z\""));
    }

    #[test]
    fn uuid_format() {
        let g = grammar_for(json!({ "type": "string", "format": "uuid" }));
        assert!(g.accepts("\"123e4567-e89b-12d3-a456-426614174000\""));
        assert!(!g.accepts("\"123e4567e89b12d3a456426614174000\""));
    }

    #[test]
    fn unknown_format_falls_back_to_string() {
        let g = grammar_for(json!({ "type": "string", "format": "hostname" }));
        assert!(g.accepts("\"anything\""));
    }

    #[test]
    fn empty_schema_is_any_object() {
        let text = compile_text(json!({}));
        assert!(text.starts_with("array ::="));
        let g = Grammar::parse(&text).unwrap();
        assert!(g.accepts("{\"k\": [1, true, null]}"));
    }

    #[test]
    fn reserved_property_names_get_suffixed() {
        let text = compile_text(json!({
            "type": "object",
            "properties": { "root": { "enum": ["x"] } },
            "required": ["root"]
        }));
        assert!(text.contains("root- ::="));
    }

    #[test]
    fn unrecognized_type_is_an_error() {
        let err = compile_str(r#"{ "type": "mystery" }"#, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, GrammarError::UnrecognizedSchema(_)));
    }

    #[test]
    fn compile_str_rejects_bad_json() {
        let err = compile_str("{ not json", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, GrammarError::Parse(_)));
    }
}
