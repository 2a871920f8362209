// 该文件是 Archdet （架构识别） 项目的一部分。
// src/category.rs - 架构组件类别表
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 固定的 30 类架构组件标签。
//!
//! 类别编号是所有已生成数据（YOLO 标注、JSON 标注、模型输出）共享的版本化常量，
//! 修改顺序会使已有的整数编码数据全部失效。

/// 类别总数
pub const CATEGORY_COUNT: usize = 30;

/// 未知标签的回退类别
pub const FALLBACK_CATEGORY: Category = Category::ExternalService;

/// 类别表之外编号的绘制颜色
pub const UNKNOWN_COLOR: [u8; 3] = [0x95, 0xa5, 0xa6];

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  fn from_label_id(id: u32) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Category {
  User = 0,
  WebBrowser = 1,
  MobileApp = 2,
  ApiGateway = 3,
  LoadBalancer = 4,
  WebServer = 5,
  AppServer = 6,
  Microservice = 7,
  Container = 8,
  Kubernetes = 9,
  LambdaFunction = 10,
  DatabaseSql = 11,
  DatabaseNosql = 12,
  Cache = 13,
  Queue = 14,
  StorageObject = 15,
  StorageBlock = 16,
  Cdn = 17,
  Firewall = 18,
  Waf = 19,
  Vpc = 20,
  Subnet = 21,
  Iam = 22,
  Kms = 23,
  SecretsManager = 24,
  Monitoring = 25,
  Logging = 26,
  ExternalService = 27,
  Dns = 28,
  EmailService = 29,
}

struct CategoryInfo {
  name: &'static str,
  backend_type: &'static str,
  color: [u8; 3],
}

const fn info(name: &'static str, backend_type: &'static str, color: u32) -> CategoryInfo {
  CategoryInfo {
    name,
    backend_type,
    color: [(color >> 16) as u8, (color >> 8) as u8, color as u8],
  }
}

// 下标即类别编号
const CATEGORY_TABLE: [CategoryInfo; CATEGORY_COUNT] = [
  info("user", "user", 0x3498db),
  info("web_browser", "user", 0x2ecc71),
  info("mobile_app", "user", 0x9b59b6),
  info("api_gateway", "api", 0xe74c3c),
  info("load_balancer", "load_balancer", 0xf39c12),
  info("web_server", "server", 0x1abc9c),
  info("app_server", "server", 0xe67e22),
  info("microservice", "server", 0x34495e),
  info("container", "server", 0x16a085),
  info("kubernetes", "server", 0x2980b9),
  info("lambda_function", "serverless", 0x8e44ad),
  info("database_sql", "database", 0xc0392b),
  info("database_nosql", "database", 0xd35400),
  info("cache", "cache", 0x27ae60),
  info("queue", "queue", 0xf1c40f),
  info("storage_object", "storage", 0x95a5a6),
  info("storage_block", "storage", 0x7f8c8d),
  info("cdn", "cdn", 0xe91e63),
  info("firewall", "security", 0xff5722),
  info("waf", "waf", 0x795548),
  info("vpc", "network", 0x607d8b),
  info("subnet", "network", 0x00bcd4),
  info("iam", "security", 0xff9800),
  info("kms", "security", 0x673ab7),
  info("secrets_manager", "security", 0x3f51b5),
  info("monitoring", "monitoring", 0x009688),
  info("logging", "monitoring", 0x4caf50),
  info("external_service", "external_service", 0xff6f00),
  info("dns", "network", 0x1e88e5),
  info("email_service", "email", 0xad1457),
];

impl Category {
  pub const ALL: [Category; CATEGORY_COUNT] = [
    Category::User,
    Category::WebBrowser,
    Category::MobileApp,
    Category::ApiGateway,
    Category::LoadBalancer,
    Category::WebServer,
    Category::AppServer,
    Category::Microservice,
    Category::Container,
    Category::Kubernetes,
    Category::LambdaFunction,
    Category::DatabaseSql,
    Category::DatabaseNosql,
    Category::Cache,
    Category::Queue,
    Category::StorageObject,
    Category::StorageBlock,
    Category::Cdn,
    Category::Firewall,
    Category::Waf,
    Category::Vpc,
    Category::Subnet,
    Category::Iam,
    Category::Kms,
    Category::SecretsManager,
    Category::Monitoring,
    Category::Logging,
    Category::ExternalService,
    Category::Dns,
    Category::EmailService,
  ];

  pub fn id(self) -> u32 {
    self as u32
  }

  fn info(self) -> &'static CategoryInfo {
    &CATEGORY_TABLE[self as usize]
  }

  pub fn name(self) -> &'static str {
    self.info().name
  }

  /// 后端服务使用的粗粒度组件类型
  pub fn backend_type(self) -> &'static str {
    self.info().backend_type
  }

  pub fn color(self) -> [u8; 3] {
    self.info().color
  }

  pub fn from_id(id: u32) -> Option<Self> {
    Self::ALL.get(id as usize).copied()
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|c| c.name() == name)
  }

  /// 解析类别名称，未知名称回退到 [`FALLBACK_CATEGORY`]，永不失败。
  pub fn resolve(name: &str) -> Self {
    Self::from_name(name).unwrap_or(FALLBACK_CATEGORY)
  }
}

/// 模型输出的类别名称，表外编号显示为 `class_<id>`。
pub fn class_name(id: u32) -> String {
  Category::from_id(id)
    .map(|c| c.name().to_string())
    .unwrap_or_else(|| format!("class_{}", id))
}

/// 表外编号回退到 `external_service` 的后端类型。
pub fn backend_type(id: u32) -> &'static str {
  Category::from_id(id)
    .unwrap_or(FALLBACK_CATEGORY)
    .backend_type()
}

pub fn color(id: u32) -> [u8; 3] {
  Category::from_id(id).map(Category::color).unwrap_or(UNKNOWN_COLOR)
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

impl WithLabel for Category {
  fn to_label_str(&self) -> String {
    self.name().to_string()
  }

  fn to_label_id(&self) -> u32 {
    self.id()
  }

  fn from_label_id(id: u32) -> Option<Self> {
    Self::from_id(id)
  }
}
