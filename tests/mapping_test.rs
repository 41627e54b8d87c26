//! Integration tests for metadata built from derived entities
//!
//! Covers table and schema construction, foreign key linking, procedures and query
//! building for structs declared with `#[derive(Entity)]` and `#[entity]`.

use std::collections::HashSet;
use std::sync::Arc;

use tablemap::prelude::*;
use tablemap::type_mapping::TypeMappingError;

#[entity]
pub struct Artist {
    #[primary_key]
    pub id: Option<i32>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Entity)]
#[table(name = "albums")]
pub struct Album {
    #[primary_key]
    pub id: Option<i32>,

    #[foreign_key(Artist)]
    pub artist_id: i32,

    #[unique]
    pub title: String,

    #[column(name = "release_year")]
    pub year: Option<i16>,
}

/// Two fields renamed onto the same column
#[derive(Entity)]
pub struct Clash {
    #[primary_key]
    pub id: i64,
    #[column(name = "label")]
    pub first: String,
    #[column(name = "label")]
    pub second: String,
}

/// Type without a serializer
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl ToValue for Point {
    fn to_value(&self) -> Value {
        Value::Text(format!("{},{}", self.x, self.y))
    }
}

impl ColumnType for Point {
    type Base = Point;
}

#[derive(Entity)]
pub struct Place {
    #[primary_key]
    pub id: i64,
    pub location: Point,
}

/// Stored procedure declaration
#[derive(Entity)]
pub struct RenameArtist {
    pub artist_id: i32,
    pub new_name: String,
}

fn mapper(dialect: Dialect) -> Mapper {
    let mut mapper = Mapper::new(dialect);
    mapper.register_input::<Artist>().unwrap();
    mapper
}

fn queen() -> Artist {
    Artist {
        id: None,
        name: "Queen".to_string(),
    }
}

#[test]
fn test_artist_table_from_derive() {
    let table = Table::from_type::<Artist>(&mapper(Dialect::Sqlite), "id", None).unwrap();

    assert_eq!(table.name(), "Artist");
    assert_eq!(table.columns().len(), 2);

    let id = table.primary_column();
    assert_eq!(id.name(), "id");
    assert!(id.is_auto_increment());
    assert!(matches!(id.kind(), ColumnKind::Primary { auto_increment: true }));

    let name = table.column("name").unwrap();
    assert!(matches!(name.kind(), ColumnKind::Plain));
    assert!(name.is_not_null());
}

#[test]
fn test_insert_query_for_artist() {
    let mapper = mapper(Dialect::Sqlite);
    let artist = queen();

    let mut builder = QueryBuilder::new(&artist, &mapper).unwrap();
    let placeholder = builder.bind("name").unwrap();
    let query = builder.build(format!("INSERT INTO Artist(name) VALUES({})", placeholder));

    assert_eq!(query.sql(), "INSERT INTO Artist(name) VALUES(?)");
    assert_eq!(query.values().len(), 1);
    assert_eq!(query.values()[0].name(), "name");
    assert_eq!(query.values()[0].value(), &Value::from("Queen"));
}

#[test]
fn test_queries_from_equal_inputs_are_equal() {
    let mapper = mapper(Dialect::Postgres);
    let build = |artist: &Artist| {
        let mut builder = QueryBuilder::new(artist, &mapper).unwrap();
        let p = builder.bind("name").unwrap();
        builder.build(format!("SELECT * FROM Artist WHERE name = {}", p))
    };

    let first = build(&queen());
    let second = build(&queen());
    let other = build(&Artist {
        id: None,
        name: "Muse".to_string(),
    });

    assert_eq!(first, second);
    assert_ne!(first, other);

    let set: HashSet<Query> = [first.clone(), second, other].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert_eq!(
        first.to_string(),
        "SELECT * FROM Artist WHERE name = ?\n  1) name: VARCHAR = 'Queen'"
    );
}

#[test]
fn test_derive_declares_columns_in_field_order() {
    let names: Vec<_> = Album::properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, ["id", "artist_id", "title", "release_year"]);
    assert_eq!(Album::primary_key(), Some("id"));
    assert_eq!(Album::table_name(), Some("albums"));
    assert_eq!(Artist::table_name(), None);
    assert_eq!(Artist::entity_name(), "Artist");
}

#[test]
fn test_renamed_columns_must_stay_unique() {
    let err = Table::from_type::<Clash>(&Mapper::new(Dialect::Sqlite), "id", None).unwrap_err();
    assert_eq!(
        err,
        MappingError::NotUniqueName {
            scope: "Clash".to_string(),
            names: vec!["label".to_string()],
        }
    );
}

#[test]
fn test_unknown_type_fails_table_construction() {
    let err = Table::from_entity::<Place>(&Mapper::new(Dialect::Postgres)).unwrap_err();
    assert!(matches!(
        err,
        MappingError::SerializerNotFound { entity: "Place", ref property, .. } if property == "location"
    ));
    assert_eq!(err.severity(), Severity::User);
}

fn point_serializer(dialect: Dialect) -> TypeSerializer {
    TypeSerializer::new::<Point>(
        dialect,
        "TEXT",
        WireType::Varchar,
        |value| match value {
            Value::Text(s) => Ok(DbValue::Text(s.clone())),
            other => Err(TypeMappingError::Encode {
                expected: "Point",
                found: format!("{:?}", other),
            }),
        },
        |value| match value {
            DbValue::Text(s) => Ok(Value::Text(s.clone())),
            other => Err(TypeMappingError::Decode {
                expected: "TEXT",
                found: format!("{:?}", other),
            }),
        },
    )
}

#[test]
fn test_registered_serializer_makes_type_mappable() {
    let mut mapper = Mapper::new(Dialect::Sqlite);
    mapper.register_serializer(point_serializer(Dialect::Sqlite)).unwrap();

    let table = Table::from_entity::<Place>(&mapper).unwrap();
    let place = Place {
        id: 1,
        location: Point { x: 3, y: 4 },
    };
    let values = table.query_values(&place, false).unwrap();
    assert_eq!(values[0].encode().unwrap(), DbValue::Text("3,4".to_string()));
}

#[test]
fn test_schema_links_album_to_artist() {
    let mapper = Mapper::new(Dialect::Postgres);
    let schema = Schema::builder("music")
        .entity::<Artist>()
        .entity::<Album>()
        .build(&mapper)
        .unwrap();

    let albums = schema.table::<Album>().unwrap();
    let artist_id = albums.column("artist_id").unwrap();
    assert_eq!(artist_id.references(), Some(Artist::entity_type()));
    assert!(Arc::ptr_eq(
        &artist_id.foreign_table().unwrap(),
        schema.table::<Artist>().unwrap()
    ));
    assert_eq!(albums.path(), "music.albums");

    let year = albums.column("release_year").unwrap();
    assert_eq!(year.db_type(), "SMALLINT");
    assert!(!year.is_not_null());
}

#[test]
fn test_schema_without_referenced_table() {
    let err = Schema::builder("music")
        .entity::<Album>()
        .build(&Mapper::new(Dialect::Sqlite))
        .unwrap_err();
    assert!(matches!(
        err,
        MappingError::UnknownForeignTable { references: "Artist", .. }
    ));
}

#[test]
fn test_procedure_from_derive() {
    let mapper = Mapper::new(Dialect::Postgres);
    let rename = Procedure::from_type::<RenameArtist>(&mapper, Some("music")).unwrap();
    let schema = Schema::builder("music")
        .entity::<Artist>()
        .build(&mapper)
        .unwrap()
        .with_procedures([rename.clone()])
        .unwrap();

    let registered = schema.procedure("music.RenameArtist").unwrap();
    assert_eq!(registered, &rename);
    assert_eq!(registered.args()[1].db_type(), "VARCHAR");
    assert!(Arc::ptr_eq(&registered.args()[0].procedure().unwrap(), &rename));

    let query = rename
        .call_query(&RenameArtist {
            artist_id: 1,
            new_name: "Queen II".to_string(),
        })
        .unwrap();
    assert_eq!(query.sql(), "CALL music.RenameArtist(?, ?)");
    assert_eq!(
        query.dialect_sql(Dialect::Postgres),
        "CALL music.RenameArtist($1, $2)"
    );
}

#[test]
fn test_query_builder_requires_registration() {
    let mapper = Mapper::new(Dialect::Sqlite);
    let artist = queen();
    assert!(matches!(
        QueryBuilder::new(&artist, &mapper),
        Err(MappingError::UnregisteredInput { entity: "Artist" })
    ));
}

#[test]
fn test_sql_generation_for_derived_tables() {
    let mapper = Mapper::new(Dialect::Sqlite);
    let schema = Schema::builder("main")
        .entity::<Artist>()
        .entity::<Album>()
        .build(&mapper)
        .unwrap();
    let sql = SqlGenerator::new(Dialect::Sqlite);
    let albums = schema.table::<Album>().unwrap();

    let create = sql.create_table(albums).unwrap();
    assert!(create.sql().contains("\"release_year\" SMALLINT,"));
    assert!(create
        .sql()
        .contains("FOREIGN KEY (\"artist_id\") REFERENCES \"Artist\" (\"id\")"));

    let album = Album {
        id: None,
        artist_id: 1,
        title: "Sheer Heart Attack".to_string(),
        year: Some(1974),
    };
    let insert = sql.insert(albums, &album).unwrap();
    assert_eq!(
        insert.sql(),
        "INSERT INTO \"albums\" (\"artist_id\", \"title\", \"release_year\") VALUES (?, ?, ?)"
    );
}
