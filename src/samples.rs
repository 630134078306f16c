//! Demonstration types covering every reflection feature.
//!
//! Used by the binary (`list` / `emit`) and by the integration tests, which
//! pin their documents.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::describe::{Describe, FieldDesc, TypeDesc, TypeRef};
use crate::resolve::Mapping;
use crate::schema::{InstanceType, Schema};

pub struct GrandfatherType {
    pub family_name: String,
}

impl Describe for GrandfatherType {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("GrandfatherType", vec![
            FieldDesc::new::<String>("family_name").tag("required"),
        ])
    }
}

pub struct SomeBaseType {
    pub some_base_property: i32,
    // required tags on private and ignored members must have no effect
    some_private_base_property: String,
    pub some_ignored_base_property: String,
    pub some_schema_ignored_property: String,
    pub grand: GrandfatherType,
    pub some_untagged_base_property: bool,
    some_unexported_untagged_base_property: bool,
}

impl Describe for SomeBaseType {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("SomeBaseType", vec![
            FieldDesc::new::<i32>("some_base_property"),
            FieldDesc::new::<String>("some_private_base_property").rename("i_am_private").private().tag("required"),
            FieldDesc::new::<String>("some_ignored_base_property").skip().tag("required"),
            FieldDesc::new::<String>("some_schema_ignored_property").tag("-,required"),
            FieldDesc::new::<GrandfatherType>("grand"),
            FieldDesc::new::<bool>("some_untagged_base_property").tag("required"),
            FieldDesc::new::<bool>("some_unexported_untagged_base_property").private(),
        ])
    }
}

struct NonExported {
    pub public_non_exported: i32,
    private_non_exported: i32,
}

impl Describe for NonExported {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("NonExported", vec![
            FieldDesc::new::<i32>("public_non_exported"),
            FieldDesc::new::<i32>("private_non_exported").private(),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ProtoEnum {
    Unset = 0,
    Great = 1,
}

impl Describe for ProtoEnum {
    fn describe() -> TypeDesc {
        TypeDesc::enumeration::<Self>("ProtoEnum", &["Unset", "Great"])
    }
}

pub struct TestUser {
    pub base: SomeBaseType,
    non_exported: NonExported,
    pub extra: HashMap<String, Value>,

    pub id: i64,
    pub name: String,
    pub friends: Vec<i64>,
    pub tags: HashMap<String, Value>,

    pub test_flag: bool,
    pub ignored_counter: i64,

    pub birth_date: DateTime<Utc>,
    pub website: url::Url,
    pub ip_address: IpAddr,

    pub photo: Vec<u8>,

    pub feeling: ProtoEnum,
    pub age: i32,
    pub email: String,

    pub baz: String,

    pub color: String,
    pub rank: i32,
    pub multiplier: f64,
}

impl Describe for TestUser {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("TestUser", vec![
            FieldDesc::embed::<SomeBaseType>("base"),
            FieldDesc::embed::<NonExported>("non_exported").private(),
            FieldDesc::embed::<HashMap<String, Value>>("extra"),
            FieldDesc::new::<i64>("id").tag("required"),
            FieldDesc::new::<String>("name").tag(
                "required,minLength=1,maxLength=20,pattern=.*,description=this is a property,\
                 title=the name,example=joe,example=lucy,default=alex",
            ),
            FieldDesc::new::<Vec<i64>>("friends").omit_empty().describe("list of IDs, omitted when empty"),
            FieldDesc::new::<HashMap<String, Value>>("tags").omit_empty(),
            FieldDesc::new::<bool>("test_flag"),
            FieldDesc::new::<i64>("ignored_counter").skip(),
            FieldDesc::new::<DateTime<Utc>>("birth_date").omit_empty(),
            FieldDesc::new::<url::Url>("website").omit_empty(),
            FieldDesc::new::<IpAddr>("ip_address").rename("network_address").omit_empty(),
            FieldDesc::new::<Vec<u8>>("photo").omit_empty().tag("required"),
            FieldDesc::new::<ProtoEnum>("feeling").omit_empty(),
            FieldDesc::new::<i32>("age").tag("minimum=18,maximum=120,exclusiveMaximum=true,exclusiveMinimum=true"),
            FieldDesc::new::<String>("email").tag("format=email"),
            FieldDesc::new::<String>("baz").extras("foo=bar,hello=world"),
            FieldDesc::new::<String>("color").tag("enum=red,enum=green,enum=blue"),
            FieldDesc::new::<i32>("rank").omit_empty().tag("enum=1,enum=2,enum=3"),
            FieldDesc::new::<f64>("multiplier").rename("mult").omit_empty().tag("enum=1.0,enum=1.5,enum=2.0"),
        ])
    }
}

/// A timestamp wrapper whose fields are all private; only a type mapper
/// gives it a useful schema.
pub struct CustomTime {
    wall: u64,
    ext: i64,
}

impl Describe for CustomTime {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("CustomTime", vec![
            FieldDesc::new::<u64>("wall").private(),
            FieldDesc::new::<i64>("ext").private(),
        ])
    }
}

pub struct CustomTypeField {
    pub created_at: CustomTime,
}

impl Describe for CustomTypeField {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("CustomTypeField", vec![
            FieldDesc::new::<CustomTime>("created_at").rename("CreatedAt"),
        ])
    }
}

/// Maps `CustomTime` to a date-time string.
pub fn custom_time_mapper(desc: &TypeDesc) -> Mapping {
    if desc.is::<CustomTime>() {
        Mapping::Replace(Schema::formatted(InstanceType::String, "date-time"))
    } else {
        Mapping::Default
    }
}

pub struct RootOneOf {
    pub field1: String,
    pub field2: String,
    pub field3: Value,
    pub field4: String,
    pub field5: ChildOneOf,
}

impl Describe for RootOneOf {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("RootOneOf", vec![
            FieldDesc::new::<String>("field1").tag("oneof_required=group1"),
            FieldDesc::new::<String>("field2").tag("oneof_required=group2"),
            FieldDesc::new::<Value>("field3").tag("oneof_type=string;array"),
            FieldDesc::new::<String>("field4").tag("oneof_required=group1"),
            FieldDesc::new::<ChildOneOf>("field5").rename("child"),
        ])
    }
}

pub struct ChildOneOf {
    pub child1: String,
    pub child2: String,
    pub child3: Value,
    pub child4: String,
}

impl Describe for ChildOneOf {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("ChildOneOf", vec![
            FieldDesc::new::<String>("child1").tag("oneof_required=group1"),
            FieldDesc::new::<String>("child2").tag("oneof_required=group2"),
            FieldDesc::new::<Value>("child3").tag("oneof_required=group2,oneof_type=string;array"),
            FieldDesc::new::<String>("child4").tag("oneof_required=group1"),
        ])
    }
}

pub struct Category {
    pub name: String,
    pub parent: Option<Box<Category>>,
    pub children: Vec<Category>,
}

impl Describe for Category {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("Category", vec![
            FieldDesc::new::<String>("name").tag("required,minLength=1"),
            FieldDesc::new::<Option<Box<Category>>>("parent"),
            FieldDesc::new::<Vec<Category>>("children").omit_empty(),
        ])
    }
}

pub struct Employee {
    pub name: String,
    pub department: Option<Box<Department>>,
}

impl Describe for Employee {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("Employee", vec![
            FieldDesc::new::<String>("name"),
            FieldDesc::new::<Option<Box<Department>>>("department"),
        ])
    }
}

pub struct Department {
    pub title: String,
    pub head: Option<Box<Employee>>,
    pub staff: Vec<Employee>,
}

impl Describe for Department {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>("Department", vec![
            FieldDesc::new::<String>("title"),
            FieldDesc::new::<Option<Box<Employee>>>("head").tag("nullable"),
            FieldDesc::new::<Vec<Employee>>("staff").tag("minItems=1,uniqueItems"),
        ])
    }
}

/// One entry of the sample catalog.
pub struct Sample {
    pub name: &'static str,
    pub about: &'static str,
    pub root: TypeRef,
    pub mapper: Option<fn(&TypeDesc) -> Mapping>,
}

impl Sample {
    fn new<T: Describe>(name: &'static str, about: &'static str) -> Self {
        Self { name, about, root: TypeRef::of::<T>(), mapper: None }
    }

    fn with_mapper(mut self, mapper: fn(&TypeDesc) -> Mapping) -> Self {
        self.mapper = Some(mapper);
        self
    }
}

pub fn catalog() -> Vec<Sample> {
    vec![
        Sample::new::<TestUser>("test-user", "embedded members, ignore rules, every validation keyword"),
        Sample::new::<RootOneOf>("one-of", "oneof_required groups and oneof_type alternatives"),
        Sample::new::<CustomTypeField>("custom-type", "type mapper replacing a record")
            .with_mapper(custom_time_mapper),
        Sample::new::<Category>("category", "self-referential record"),
        Sample::new::<Department>("department", "mutually referential records"),
    ]
}

pub fn find(name: &str) -> Option<Sample> {
    catalog().into_iter().find(|s| s.name == name)
}
