//! Integration tests against PostgreSQL
//!
//! Skipped unless DATABASE_URL points at a PostgreSQL database the tests may write to.

use tablemap::prelude::*;

#[entity]
pub struct Artist {
    #[primary_key]
    pub id: Option<i32>,
    #[unique]
    pub name: String,
}

#[derive(Debug, Clone, Entity)]
#[table(name = "albums")]
pub struct Album {
    #[primary_key]
    pub id: Option<i32>,
    #[foreign_key(Artist)]
    pub artist_id: i32,
    pub title: String,
    pub year: Option<i16>,
    pub edition: char,
}

const SCHEMA: &str = "tablemap_it";

async fn setup() -> Option<Tablemap> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let database = DatabaseConfig::from_url(url).expect("DATABASE_URL must be a postgres URL");
    let config = AppConfig {
        mapper: MapperConfig::new(database.dialect),
        database,
    };

    let mut tablemap = Tablemap::new(&config)
        .await
        .expect("Failed to connect to database");
    let schema = Schema::builder(SCHEMA)
        .entity::<Artist>()
        .entity::<Album>()
        .build(tablemap.mapper())
        .unwrap();
    tablemap.register_schema(schema).unwrap();
    tablemap.drop_tables(SCHEMA).await.unwrap();
    tablemap.create_tables(SCHEMA).await.unwrap();
    Some(tablemap)
}

#[tokio::test]
async fn test_postgres_round_trip() {
    let Some(tablemap) = setup().await else {
        return;
    };

    let artist_id = tablemap
        .insert(&Artist {
            id: None,
            name: "Queen".to_string(),
        })
        .await
        .unwrap();
    let Some(Value::I32(artist_id)) = artist_id else {
        panic!("expected generated integer key, got {:?}", artist_id);
    };

    let album = Album {
        id: None,
        artist_id,
        title: "Jazz".to_string(),
        year: None,
        edition: ' ',
    };
    tablemap.insert(&album).await.unwrap();

    let rows = tablemap.find_all::<Album>().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], Value::I32(artist_id));
    assert_eq!(rows[0][2], Value::from("Jazz"));
    assert_eq!(rows[0][3], Value::Null);
    assert_eq!(rows[0][4], Value::Char(' '));

    let orphan = Album {
        artist_id: artist_id + 1000,
        ..album
    };
    assert!(matches!(
        tablemap.insert(&orphan).await,
        Err(TablemapError::Database(_))
    ));

    tablemap.drop_tables(SCHEMA).await.unwrap();
}
