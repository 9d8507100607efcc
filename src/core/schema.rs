//! Schema description and the compiled field plan
//!
//! A [`SchemaDescription`] is the structured form of the schema: entity
//! types with their scalar and relationship fields, plus the root query
//! and mutation operations. It can be loaded from YAML or taken from
//! [`SchemaDescription::blog`].
//!
//! [`Schema::compile`] checks the description against what the engine can
//! actually serve and builds, once, the table mapping every
//! `(entity kind, field name)` pair to a [`FieldStrategy`]. The executor
//! only ever consults this table; it never dispatches on raw names.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::entity::{EntityKind, ScalarField, ScalarType};
use crate::core::error::{BlogError, BlogResult, ConfigError};
use crate::core::resolver::{Cardinality, Relation};

/// Field name reserved for the type name meta-field
pub const TYPENAME_FIELD: &str = "__typename";

// =============================================================================
// Description
// =============================================================================

/// Structured schema, as produced by a schema loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Entity types
    pub entities: Vec<EntityDescription>,

    /// Root query operations
    #[serde(default)]
    pub queries: Vec<OperationDescription>,

    /// Root mutation operations
    #[serde(default)]
    pub mutations: Vec<OperationDescription>,
}

/// An entity type and its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    /// Type name (e.g., "User")
    pub name: String,

    /// Stored scalar fields
    #[serde(default)]
    pub fields: Vec<ScalarFieldDescription>,

    /// Derived relationship fields
    #[serde(default)]
    pub relations: Vec<RelationDescription>,
}

/// A scalar field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarFieldDescription {
    pub name: String,

    #[serde(rename = "type")]
    pub scalar_type: ScalarType,

    #[serde(default)]
    pub nullable: bool,
}

/// A relationship field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescription {
    pub name: String,

    /// Target entity type name
    pub target: String,

    pub cardinality: Cardinality,
}

/// A root operation declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescription {
    pub name: String,

    #[serde(default)]
    pub arguments: Vec<ArgumentDescription>,

    /// Entity type name of the result
    pub returns: String,

    pub cardinality: Cardinality,
}

/// A root operation argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDescription {
    pub name: String,

    /// Scalar or input type name (e.g., "String", "CreateUserInput")
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub nullable: bool,
}

impl SchemaDescription {
    /// Load a schema description from a YAML file
    pub fn from_yaml_file(path: &str) -> BlogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Load a schema description from a YAML string
    pub fn from_yaml_str(yaml: &str) -> BlogResult<Self> {
        Self::parse(yaml, "<inline>")
    }

    fn parse(yaml: &str, origin: &str) -> BlogResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::Load {
                path: origin.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// The blog schema: users, posts, comments and their operations
    pub fn blog() -> Self {
        let scalar = |name: &str, scalar_type: ScalarType, nullable: bool| ScalarFieldDescription {
            name: name.to_string(),
            scalar_type,
            nullable,
        };
        let relation = |name: &str, target: &str, cardinality: Cardinality| RelationDescription {
            name: name.to_string(),
            target: target.to_string(),
            cardinality,
        };

        let entities = vec![
            EntityDescription {
                name: "User".to_string(),
                fields: vec![
                    scalar("id", ScalarType::Id, false),
                    scalar("name", ScalarType::String, false),
                    scalar("email", ScalarType::String, false),
                    scalar("age", ScalarType::Int, true),
                ],
                relations: vec![
                    relation("posts", "Post", Cardinality::Many),
                    relation("comments", "Comment", Cardinality::Many),
                ],
            },
            EntityDescription {
                name: "Post".to_string(),
                fields: vec![
                    scalar("id", ScalarType::Id, false),
                    scalar("title", ScalarType::String, false),
                    scalar("body", ScalarType::String, false),
                    scalar("published", ScalarType::Boolean, false),
                ],
                relations: vec![
                    relation("author", "User", Cardinality::One),
                    relation("comments", "Comment", Cardinality::Many),
                ],
            },
            EntityDescription {
                name: "Comment".to_string(),
                fields: vec![
                    scalar("id", ScalarType::Id, false),
                    scalar("text", ScalarType::String, false),
                ],
                relations: vec![
                    relation("author", "User", Cardinality::One),
                    relation("post", "Post", Cardinality::One),
                ],
            },
        ];

        let describe = |op: RootOperation| op.expected_description();

        Self {
            entities,
            queries: RootOperation::ALL
                .into_iter()
                .filter(|op| !op.is_mutation())
                .map(describe)
                .collect(),
            mutations: RootOperation::ALL
                .into_iter()
                .filter(|op| op.is_mutation())
                .map(describe)
                .collect(),
        }
    }
}

// =============================================================================
// Root operations
// =============================================================================

/// Root operations the executor can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootOperation {
    Users,
    Posts,
    Me,
    Post,
    Comments,
    CreateUser,
    CreatePost,
    CreateComment,
}

impl RootOperation {
    pub const ALL: [RootOperation; 8] = [
        RootOperation::Users,
        RootOperation::Posts,
        RootOperation::Me,
        RootOperation::Post,
        RootOperation::Comments,
        RootOperation::CreateUser,
        RootOperation::CreatePost,
        RootOperation::CreateComment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RootOperation::Users => "users",
            RootOperation::Posts => "posts",
            RootOperation::Me => "me",
            RootOperation::Post => "post",
            RootOperation::Comments => "comments",
            RootOperation::CreateUser => "createUser",
            RootOperation::CreatePost => "createPost",
            RootOperation::CreateComment => "createComment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RootOperation::CreateUser | RootOperation::CreatePost | RootOperation::CreateComment
        )
    }

    /// Entity kind and cardinality of the result
    pub fn returns(&self) -> (EntityKind, Cardinality) {
        match self {
            RootOperation::Users => (EntityKind::User, Cardinality::Many),
            RootOperation::Posts => (EntityKind::Post, Cardinality::Many),
            RootOperation::Me => (EntityKind::User, Cardinality::One),
            RootOperation::Post => (EntityKind::Post, Cardinality::One),
            RootOperation::Comments => (EntityKind::Comment, Cardinality::Many),
            RootOperation::CreateUser => (EntityKind::User, Cardinality::One),
            RootOperation::CreatePost => (EntityKind::Post, Cardinality::One),
            RootOperation::CreateComment => (EntityKind::Comment, Cardinality::One),
        }
    }

    /// Arguments as (name, type, nullable)
    pub fn arguments(&self) -> &'static [(&'static str, &'static str, bool)] {
        match self {
            RootOperation::Users | RootOperation::Posts => &[("query", "String", true)],
            RootOperation::Me | RootOperation::Post | RootOperation::Comments => &[],
            RootOperation::CreateUser => &[("data", "CreateUserInput", false)],
            RootOperation::CreatePost => &[("data", "CreatePostInput", false)],
            RootOperation::CreateComment => &[("data", "CreateCommentInput", false)],
        }
    }

    fn expected_description(self) -> OperationDescription {
        let (kind, cardinality) = self.returns();
        OperationDescription {
            name: self.name().to_string(),
            arguments: self
                .arguments()
                .iter()
                .map(|(name, type_name, nullable)| ArgumentDescription {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                    nullable: *nullable,
                })
                .collect(),
            returns: kind.name().to_string(),
            cardinality,
        }
    }
}

/// Input object types accepted by mutations, as (type, [(field, type)])
const INPUT_TYPES: &[(&str, &[(&str, &str)])] = &[
    (
        "CreateUserInput",
        &[("name", "String!"), ("email", "String!"), ("age", "Int")],
    ),
    (
        "CreatePostInput",
        &[
            ("title", "String!"),
            ("body", "String!"),
            ("published", "Boolean!"),
            ("author", "ID!"),
        ],
    ),
    (
        "CreateCommentInput",
        &[("text", "String!"), ("author", "ID!"), ("post", "ID!")],
    ),
];

// =============================================================================
// Compiled schema
// =============================================================================

/// How a field of an entity is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// Read a stored scalar directly
    Scalar(ScalarField),
    /// Follow a relationship through the resolver
    Relation(Relation),
    /// The entity type name
    Typename,
}

/// A validated schema with its field plan
#[derive(Debug, Clone)]
pub struct Schema {
    description: SchemaDescription,
    plans: HashMap<EntityKind, IndexMap<String, FieldStrategy>>,
    operations: IndexMap<String, RootOperation>,
}

impl Schema {
    /// Compile the built-in blog schema
    pub fn blog() -> BlogResult<Self> {
        Self::compile(SchemaDescription::blog())
    }

    /// Validate a description and build the field plan
    pub fn compile(description: SchemaDescription) -> BlogResult<Self> {
        let mut plans: HashMap<EntityKind, IndexMap<String, FieldStrategy>> = HashMap::new();

        for entity in &description.entities {
            let kind = entity_kind(&entity.name)?;
            if plans.contains_key(&kind) {
                return Err(duplicate(&entity.name));
            }

            let mut plan = IndexMap::new();
            for field in &entity.fields {
                let strategy = compile_scalar(kind, field)?;
                if plan.insert(field.name.clone(), strategy).is_some() {
                    return Err(duplicate(&format!("{}.{}", entity.name, field.name)));
                }
            }
            for relation in &entity.relations {
                let strategy = compile_relation(kind, relation)?;
                if plan.insert(relation.name.clone(), strategy).is_some() {
                    return Err(duplicate(&format!("{}.{}", entity.name, relation.name)));
                }
            }
            plan.insert(TYPENAME_FIELD.to_string(), FieldStrategy::Typename);

            plans.insert(kind, plan);
        }

        // Relationship targets must be declared types too
        for entity in &description.entities {
            for relation in &entity.relations {
                if !plans.contains_key(&entity_kind(&relation.target)?) {
                    return Err(ConfigError::UnknownEntity {
                        name: relation.target.clone(),
                    }
                    .into());
                }
            }
        }

        let mut operations = IndexMap::new();
        let roots = description
            .queries
            .iter()
            .map(|op| (op, false))
            .chain(description.mutations.iter().map(|op| (op, true)));
        for (op, is_mutation) in roots {
            let root = compile_operation(op, is_mutation)?;
            if !plans.contains_key(&root.returns().0) {
                return Err(ConfigError::UnknownEntity {
                    name: op.returns.clone(),
                }
                .into());
            }
            if operations.insert(op.name.clone(), root).is_some() {
                return Err(duplicate(&op.name));
            }
        }

        tracing::debug!(
            entities = plans.len(),
            operations = operations.len(),
            "Schema compiled"
        );

        Ok(Self {
            description,
            plans,
            operations,
        })
    }

    /// How `field` of `kind` is produced, `None` when the schema does not declare it
    pub fn field(&self, kind: EntityKind, field: &str) -> Option<FieldStrategy> {
        self.plans.get(&kind)?.get(field).copied()
    }

    /// The root operation declared under `name`
    pub fn operation(&self, name: &str) -> Option<RootOperation> {
        self.operations.get(name).copied()
    }

    /// Declared root operations, in declaration order
    pub fn operations(&self) -> impl Iterator<Item = RootOperation> + '_ {
        self.operations.values().copied()
    }

    pub fn description(&self) -> &SchemaDescription {
        &self.description
    }

    /// Render the schema as GraphQL SDL
    pub fn to_sdl(&self) -> String {
        let mut sdl = String::new();

        for entity in &self.description.entities {
            sdl.push_str(&format!("type {} {{\n", entity.name));
            for field in &entity.fields {
                let bang = if field.nullable { "" } else { "!" };
                sdl.push_str(&format!(
                    "  {}: {}{}\n",
                    field.name,
                    field.scalar_type.name(),
                    bang
                ));
            }
            for relation in &entity.relations {
                sdl.push_str(&format!(
                    "  {}: {}\n",
                    relation.name,
                    render_type(&relation.target, relation.cardinality)
                ));
            }
            sdl.push_str("}\n\n");
        }

        if !self.description.queries.is_empty() {
            sdl.push_str(&render_root("Query", &self.description.queries));
        }
        if !self.description.mutations.is_empty() {
            sdl.push_str(&render_root("Mutation", &self.description.mutations));
        }

        for (name, fields) in INPUT_TYPES {
            let used = self
                .description
                .mutations
                .iter()
                .flat_map(|op| &op.arguments)
                .any(|arg| arg.type_name == *name);
            if !used {
                continue;
            }
            sdl.push_str(&format!("input {} {{\n", name));
            for (field, type_name) in *fields {
                sdl.push_str(&format!("  {}: {}\n", field, type_name));
            }
            sdl.push_str("}\n\n");
        }

        sdl.push_str("schema {\n");
        if !self.description.queries.is_empty() {
            sdl.push_str("  query: Query\n");
        }
        if !self.description.mutations.is_empty() {
            sdl.push_str("  mutation: Mutation\n");
        }
        sdl.push_str("}\n");

        sdl
    }
}

fn entity_kind(name: &str) -> BlogResult<EntityKind> {
    EntityKind::from_name(name).ok_or_else(|| {
        ConfigError::UnknownEntity {
            name: name.to_string(),
        }
        .into()
    })
}

fn duplicate(name: &str) -> BlogError {
    ConfigError::Duplicate {
        name: name.to_string(),
    }
    .into()
}

fn compile_scalar(kind: EntityKind, field: &ScalarFieldDescription) -> BlogResult<FieldStrategy> {
    let spec = kind
        .scalar_field(&field.name)
        .ok_or_else(|| ConfigError::UnknownField {
            entity: kind.name().to_string(),
            field: field.name.clone(),
        })?;

    // Declaring a stored nullable field as non-null would promise values we may not have
    if spec.scalar_type != field.scalar_type || (spec.nullable && !field.nullable) {
        let render = |t: ScalarType, nullable: bool| {
            format!("{}{}", t.name(), if nullable { "" } else { "!" })
        };
        return Err(ConfigError::FieldTypeMismatch {
            entity: kind.name().to_string(),
            field: field.name.clone(),
            declared: render(field.scalar_type, field.nullable),
            actual: render(spec.scalar_type, spec.nullable),
        }
        .into());
    }

    Ok(FieldStrategy::Scalar(spec.field))
}

fn compile_relation(kind: EntityKind, relation: &RelationDescription) -> BlogResult<FieldStrategy> {
    let unknown = || ConfigError::UnknownRelation {
        entity: kind.name().to_string(),
        field: relation.name.clone(),
        target: relation.target.clone(),
    };

    let resolved = Relation::lookup(kind, &relation.name).ok_or_else(unknown)?;
    if resolved.target().name() != relation.target || resolved.cardinality() != relation.cardinality
    {
        return Err(unknown().into());
    }

    Ok(FieldStrategy::Relation(resolved))
}

fn compile_operation(op: &OperationDescription, is_mutation: bool) -> BlogResult<RootOperation> {
    let root = RootOperation::from_name(&op.name).ok_or_else(|| ConfigError::UnknownOperation {
        name: op.name.clone(),
    })?;

    let invalid = |message: String| ConfigError::InvalidSignature {
        operation: op.name.clone(),
        message,
    };

    if root.is_mutation() != is_mutation {
        let expected = if root.is_mutation() { "mutation" } else { "query" };
        return Err(invalid(format!("must be declared as a {}", expected)).into());
    }

    let expected = root.expected_description();
    if op.returns != expected.returns || op.cardinality != expected.cardinality {
        return Err(invalid(format!(
            "must return {}",
            render_type(&expected.returns, expected.cardinality)
        ))
        .into());
    }
    if op.arguments != expected.arguments {
        return Err(invalid(format!(
            "arguments must be ({})",
            render_arguments(&expected.arguments)
        ))
        .into());
    }

    Ok(root)
}

fn render_type(name: &str, cardinality: Cardinality) -> String {
    match cardinality {
        Cardinality::One => format!("{}!", name),
        Cardinality::Many => format!("[{}!]!", name),
    }
}

fn render_arguments(arguments: &[ArgumentDescription]) -> String {
    arguments
        .iter()
        .map(|arg| {
            format!(
                "{}: {}{}",
                arg.name,
                arg.type_name,
                if arg.nullable { "" } else { "!" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_root(type_name: &str, operations: &[OperationDescription]) -> String {
    let mut sdl = format!("type {} {{\n", type_name);
    for op in operations {
        let args = if op.arguments.is_empty() {
            String::new()
        } else {
            format!("({})", render_arguments(&op.arguments))
        };
        sdl.push_str(&format!(
            "  {}{}: {}\n",
            op.name,
            args,
            render_type(&op.returns, op.cardinality)
        ));
    }
    sdl.push_str("}\n\n");
    sdl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_schema_compiles() {
        let schema = Schema::blog().expect("built-in schema should compile");
        assert_eq!(schema.operations().count(), 8);
        assert_eq!(schema.operation("me"), Some(RootOperation::Me));
        assert_eq!(schema.operation("deleteUser"), None);
    }

    #[test]
    fn test_field_plan() {
        let schema = Schema::blog().unwrap();
        assert_eq!(
            schema.field(EntityKind::User, "email"),
            Some(FieldStrategy::Scalar(ScalarField::Email))
        );
        assert_eq!(
            schema.field(EntityKind::Comment, "post"),
            Some(FieldStrategy::Relation(Relation::CommentPost))
        );
        assert_eq!(
            schema.field(EntityKind::Post, TYPENAME_FIELD),
            Some(FieldStrategy::Typename)
        );
        assert_eq!(schema.field(EntityKind::Post, "password"), None);
    }

    #[test]
    fn test_undeclared_fields_are_not_planned() {
        let mut description = SchemaDescription::blog();
        description.entities[0].fields.retain(|f| f.name != "email");
        let schema = Schema::compile(description).unwrap();
        assert_eq!(schema.field(EntityKind::User, "email"), None);
        assert!(schema.field(EntityKind::User, "name").is_some());
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let mut description = SchemaDescription::blog();
        description.entities[0].name = "Account".to_string();
        let err = Schema::compile(description).unwrap_err();
        assert!(err.to_string().contains("Account"));
    }

    #[test]
    fn test_unknown_scalar_rejected() {
        let mut description = SchemaDescription::blog();
        description.entities[1].fields.push(ScalarFieldDescription {
            name: "views".to_string(),
            scalar_type: ScalarType::Int,
            nullable: false,
        });
        let err = Schema::compile(description).unwrap_err();
        assert_eq!(err.to_string(), "Unknown field 'views' on entity 'Post'");
    }

    #[test]
    fn test_scalar_type_mismatch_rejected() {
        let mut description = SchemaDescription::blog();
        // age is optional on the record, so it cannot be declared Int!
        description.entities[0].fields[3].nullable = false;
        let err = Schema::compile(description).unwrap_err();
        assert!(err.to_string().contains("declared as Int!"));
    }

    #[test]
    fn test_relation_with_wrong_cardinality_rejected() {
        let mut description = SchemaDescription::blog();
        description.entities[1].relations[0].cardinality = Cardinality::Many;
        assert!(Schema::compile(description).is_err());
    }

    #[test]
    fn test_relation_target_must_be_declared() {
        let mut description = SchemaDescription::blog();
        description.entities.retain(|e| e.name != "Comment");
        description.queries.retain(|op| op.returns != "Comment");
        description.mutations.retain(|op| op.returns != "Comment");
        let err = Schema::compile(description).unwrap_err();
        assert!(err.to_string().contains("Comment"));
    }

    #[test]
    fn test_operation_signature_checked() {
        let mut description = SchemaDescription::blog();
        description.queries[0].arguments.clear();
        let err = Schema::compile(description).unwrap_err();
        assert!(err.to_string().contains("arguments must be (query: String)"));
    }

    #[test]
    fn test_mutation_declared_as_query_rejected() {
        let mut description = SchemaDescription::blog();
        let create = description.mutations.remove(0);
        description.queries.push(create);
        let err = Schema::compile(description).unwrap_err();
        assert!(err.to_string().contains("must be declared as a mutation"));
    }

    #[test]
    fn test_duplicate_operation_rejected() {
        let mut description = SchemaDescription::blog();
        let users = description.queries[0].clone();
        description.queries.push(users);
        assert!(Schema::compile(description).is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = serde_yaml::to_string(&SchemaDescription::blog()).unwrap();
        let parsed = SchemaDescription::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, SchemaDescription::blog());
    }

    #[test]
    fn test_yaml_uses_graphql_names() {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: id, type: ID }
      - { name: name, type: String }
queries:
  - name: me
    returns: User
    cardinality: one
"#;
        let schema = Schema::compile(SchemaDescription::from_yaml_str(yaml).unwrap()).unwrap();
        assert_eq!(schema.operation("me"), Some(RootOperation::Me));
        assert_eq!(schema.operation("users"), None);
        assert_eq!(schema.field(EntityKind::User, "posts"), None);
    }

    #[test]
    fn test_sdl_rendering() {
        let sdl = Schema::blog().unwrap().to_sdl();
        assert!(sdl.contains("type User {\n  id: ID!\n  name: String!\n  email: String!\n  age: Int\n"));
        assert!(sdl.contains("  posts: [Post!]!\n"));
        assert!(sdl.contains("  author: User!\n"));
        assert!(sdl.contains("  users(query: String): [User!]!\n"));
        assert!(sdl.contains("  me: User!\n"));
        assert!(sdl.contains("  createComment(data: CreateCommentInput!): Comment!\n"));
        assert!(sdl.contains("input CreatePostInput {\n  title: String!\n"));
        assert!(sdl.ends_with("schema {\n  query: Query\n  mutation: Mutation\n}\n"));
    }
}
