//! Builtin environment description.
//!
//! The host describes its builtin types and method containers declaratively;
//! [`crate::TypeManager::from_environment`] turns the description into
//! registered descriptors before any user class is seen. A *container* is a
//! builtin type whose methods apply to another type with an explicit leading
//! self-parameter; member lookup falls back to the container when a direct
//! lookup finds nothing.

use sable_core::{Mode, TypeFlags};

/// One builtin method, by type names still to be resolved.
#[derive(Debug, Clone)]
pub struct BuiltinMethod {
    pub name: String,
    /// `(mode, type name)` per parameter. Container methods include the
    /// leading self-parameter.
    pub params: Vec<(Mode, String)>,
    pub return_type: Option<String>,
}

impl BuiltinMethod {
    pub fn new(name: &str, params: &[(Mode, &str)], return_type: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(m, t)| (*m, (*t).to_string()))
                .collect(),
            return_type: return_type.map(str::to_string),
        }
    }
}

/// One builtin type.
#[derive(Debug, Clone)]
pub struct BuiltinType {
    pub name: String,
    pub flags: TypeFlags,
    /// Declared abstract supertypes, by name.
    pub parents: Vec<String>,
    /// Name of the method container serving this type, if any.
    pub container: Option<String>,
    pub methods: Vec<BuiltinMethod>,
}

impl BuiltinType {
    pub fn new(name: &str, flags: TypeFlags) -> Self {
        Self {
            name: name.to_string(),
            flags: flags | TypeFlags::BUILTIN,
            parents: Vec::new(),
            container: None,
            methods: Vec::new(),
        }
    }

    pub fn parent(mut self, name: &str) -> Self {
        self.parents.push(name.to_string());
        self
    }

    pub fn container(mut self, name: &str) -> Self {
        self.container = Some(name.to_string());
        self
    }

    pub fn method(mut self, method: BuiltinMethod) -> Self {
        self.methods.push(method);
        self
    }
}

/// The whole environment handed to the registry at startup.
#[derive(Debug, Clone)]
pub struct BuiltinEnvironment {
    /// Name of the distinguished top type every type is a subtype of.
    pub top: String,
    pub types: Vec<BuiltinType>,
}

impl BuiltinEnvironment {
    /// The smallest useful environment: the `$OB` top, the `$NUM` numeric
    /// contract, the scalar value types, `STR`, and an `INT` method
    /// container carrying arithmetic, equality and the `upto!` iterator.
    pub fn minimal() -> Self {
        let int_ops = BuiltinType::new("INT_OPS", TypeFlags::empty())
            .method(BuiltinMethod::new(
                "plus",
                &[(Mode::In, "INT"), (Mode::In, "INT")],
                Some("INT"),
            ))
            .method(BuiltinMethod::new(
                "minus",
                &[(Mode::In, "INT"), (Mode::In, "INT")],
                Some("INT"),
            ))
            .method(BuiltinMethod::new(
                "is_eq",
                &[(Mode::In, "INT"), (Mode::In, "INT")],
                Some("BOOL"),
            ))
            .method(BuiltinMethod::new(
                "is_lt",
                &[(Mode::In, "INT"), (Mode::In, "INT")],
                Some("BOOL"),
            ))
            .method(BuiltinMethod::new(
                "upto!",
                &[(Mode::Once, "INT"), (Mode::Once, "INT")],
                Some("INT"),
            ));

        Self {
            top: "$OB".to_string(),
            types: vec![
                BuiltinType::new("$OB", TypeFlags::ABSTRACT),
                BuiltinType::new("$NUM", TypeFlags::ABSTRACT).parent("$OB"),
                BuiltinType::new("INT", TypeFlags::VALUE)
                    .parent("$NUM")
                    .container("INT_OPS"),
                BuiltinType::new("BOOL", TypeFlags::VALUE).parent("$OB"),
                BuiltinType::new("CHAR", TypeFlags::VALUE).parent("$OB"),
                BuiltinType::new("FLT", TypeFlags::VALUE).parent("$NUM"),
                BuiltinType::new("STR", TypeFlags::empty()).parent("$OB"),
                int_ops,
            ],
        }
    }
}
