// 该文件是 Archdet （架构识别） 项目的一部分。
// tests/normalize.rs - 标注修复测试
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

use archdet::{
  normalize::{self, LineOutcome, NormalizeStats},
  yolo::YoloRecord,
};
use tempfile::TempDir;

const EPS: f64 = 1e-9;

/// 生成 6 位小数的随机标注行，与文件中读到的精度一致。
fn random_line(rng: &mut fastrand::Rng) -> String {
  format!(
    "{} {:.6} {:.6} {:.6} {:.6}",
    rng.u32(0..30),
    rng.f64() * 1.4 - 0.2,
    rng.f64() * 1.4 - 0.2,
    rng.f64() * 1.2,
    rng.f64() * 1.2,
  )
}

/// 每个轴至多一侧越界
fn at_most_one_violation_per_axis(record: &YoloRecord) -> bool {
  let [left, top, right, bottom] = record.bbox.edges();
  !(left < 0.0 && right > 1.0) && !(top < 0.0 && bottom > 1.0)
}

#[test]
fn rewrites_file_in_place() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("diagram.txt");
  std::fs::write(
    &path,
    "3 1.20 0.5 0.2 0.2\n3 0.95 0.5 0.2 0.2\n\n0 0.5 0.5 0.2 0.2\n",
  )
  .unwrap();

  let stats = normalize::normalize_file(&path).unwrap();
  assert_eq!(
    stats,
    NormalizeStats {
      total: 3,
      fixed: 1,
      removed: 1,
      unchanged: 1,
    }
  );

  let content = std::fs::read_to_string(&path).unwrap();
  assert_eq!(
    content,
    "3 0.950000 0.500000 0.100000 0.200000\n0 0.500000 0.500000 0.200000 0.200000\n"
  );
}

#[test]
fn file_with_only_removed_records_becomes_empty() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("empty.txt");
  std::fs::write(&path, "1 -0.5 0.5 0.1 0.1\nnot a record\n").unwrap();

  let stats = normalize::normalize_file(&path).unwrap();
  assert_eq!(stats.removed, 2);
  assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn directory_report_totals_all_files() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("a.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();
  std::fs::write(dir.path().join("b.txt"), "1 0.95 0.5 0.2 0.2\n2 1.3 0.5 0.1 0.1\n").unwrap();
  std::fs::write(dir.path().join("notes.md"), "0 1.3 0.5 0.1 0.1\n").unwrap();

  let report = normalize::normalize_directory(dir.path()).unwrap();
  assert_eq!(report.files.len(), 2);
  assert_eq!(report.files_with_issues(), 1);
  assert_eq!(report.files[0].path.file_name().unwrap(), "a.txt");
  assert_eq!(
    report.total,
    NormalizeStats {
      total: 3,
      fixed: 1,
      removed: 1,
      unchanged: 1,
    }
  );
  // 非标注文件不会被改动
  assert_eq!(
    std::fs::read_to_string(dir.path().join("notes.md")).unwrap(),
    "0 1.3 0.5 0.1 0.1\n"
  );
}

#[test]
fn missing_directory_is_an_error() {
  let dir = TempDir::new().unwrap();
  assert!(normalize::normalize_directory(&dir.path().join("missing")).is_err());
}

#[test]
fn second_pass_changes_nothing() {
  let mut rng = fastrand::Rng::with_seed(42);
  let mut checked = 0;

  for _ in 0..5000 {
    let line = random_line(&mut rng);
    let record: YoloRecord = line.parse().unwrap();
    if !at_most_one_violation_per_axis(&record) {
      continue;
    }

    let Some(first) = normalize::normalize_line(&line).into_record() else {
      continue;
    };
    let written = first.to_string();
    match normalize::normalize_line(&written) {
      LineOutcome::Unchanged(second) => assert_eq!(second.to_string(), written, "{}", line),
      other => panic!("{} -> {} -> {:?}", line, written, other),
    }
    checked += 1;
  }

  assert!(checked > 1000);
}

#[test]
fn surviving_records_lie_on_canvas() {
  let mut rng = fastrand::Rng::with_seed(7);

  for _ in 0..5000 {
    let line = random_line(&mut rng);
    let input: YoloRecord = line.parse().unwrap();
    let outcome = normalize::normalize_line(&line);

    let centers_ok = (-0.15..=1.15).contains(&input.bbox.x_center)
      && (-0.15..=1.15).contains(&input.bbox.y_center);
    let Some(output) = outcome.record() else {
      assert!(!centers_ok, "{} was removed", line);
      continue;
    };
    assert!(centers_ok, "{} should be removed", line);

    let bbox = output.bbox;
    assert!((0.0..=1.0).contains(&bbox.x_center), "{}", line);
    assert!((0.0..=1.0).contains(&bbox.y_center), "{}", line);
    assert!(bbox.width >= 0.01 && bbox.width <= 1.0, "{}", line);
    assert!(bbox.height >= 0.01 && bbox.height <= 1.0, "{}", line);
    assert_eq!(output.class_id, input.class_id);

    // 最小尺寸下限可能把贴边的框推出画布，只检查未触发下限的轴
    if at_most_one_violation_per_axis(&input) {
      let [left, top, right, bottom] = bbox.edges();
      if bbox.width > 0.01 {
        assert!(left >= -EPS && right <= 1.0 + EPS, "{} -> {}", line, output);
      }
      if bbox.height > 0.01 {
        assert!(top >= -EPS && bottom <= 1.0 + EPS, "{} -> {}", line, output);
      }
    }
  }
}
