//! Shared request records for the binding tests
#![allow(dead_code)]

use once_cell::sync::Lazy;
use reqbind::{Field, FileAttachment, Record, ScalarType, Shape};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    pub level: u8,
}

impl Record for Role {
    fn shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Role")
                .field(Field::scalar("name", ScalarType::String).json("name").rules("required"))
                .field(Field::scalar("level", ScalarType::U8).json("level").rules("omitempty,lte=5"))
                .build()
        });
        &SHAPE
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub note: String,
}

impl Record for Meta {
    fn shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Meta")
                .field(Field::scalar("note", ScalarType::String).json("note").rules("max=20"))
                .build()
        });
        &SHAPE
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUser {
    #[serde(rename = "fullName")]
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub role: String,
    #[serde(rename = "teamId")]
    pub team_id: String,
    pub roles: Vec<Role>,
    pub meta: Option<Meta>,
    pub tags: Vec<String>,
}

impl Record for CreateUser {
    fn shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("CreateUser")
                .field(
                    Field::scalar("name", ScalarType::String)
                        .json("fullName")
                        .form("full_name")
                        .rules("required,max=20"),
                )
                .field(
                    Field::scalar("email", ScalarType::String)
                        .json("email")
                        .form("email")
                        .rules("required,email"),
                )
                .field(Field::optional("age", ScalarType::I32).json("age").form("age").rules("omitempty,min=18"))
                .field(
                    Field::scalar("role", ScalarType::String)
                        .json("role")
                        .form("role")
                        .rules("omitempty,oneof=admin user guest"),
                )
                .field(
                    Field::scalar("team_id", ScalarType::String)
                        .json("teamId")
                        .form("team_id")
                        .rules("omitempty,uuid"),
                )
                .field(Field::records("roles", Role::shape).json("roles").rules("dive"))
                .field(Field::optional_record("meta", Meta::shape).json("meta"))
                .field(Field::list("tags", ScalarType::String).json("tags").form("tag").rules("dive,max=5"))
                .build()
        });
        &SHAPE
    }
}

impl CreateUser {
    pub fn valid() -> Self {
        Self {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            age: Some(36),
            role: "admin".into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Upload {
    pub title: String,
    pub attachment: Option<FileAttachment>,
    pub extras: Vec<FileAttachment>,
}

impl Record for Upload {
    fn shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Upload")
                .field(Field::scalar("title", ScalarType::String).form("title").rules("required"))
                .field(Field::file("attachment").form("file").rules("required"))
                .field(Field::files("extras").form("extras").rules("max=2"))
                .build()
        });
        &SHAPE
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    pub active: Option<bool>,
    pub age: Option<i32>,
    pub ratio: f32,
    pub avatar: Option<FileAttachment>,
}

impl Record for Prefs {
    fn shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Prefs")
                .field(
                    Field::optional("active", ScalarType::Bool)
                        .json("active")
                        .form("active")
                        .rules("required"),
                )
                .field(
                    Field::optional("age", ScalarType::I32)
                        .json("age")
                        .form("age")
                        .rules("omitempty,min=18"),
                )
                .field(Field::scalar("ratio", ScalarType::F32).json("ratio").form("ratio"))
                .field(Field::file("avatar").json("avatar").form("avatar"))
                .build()
        });
        &SHAPE
    }
}
