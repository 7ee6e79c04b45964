use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use assert_fs::TempDir;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use rstest::*;

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

/// 生成一张 32x32 的测试图片，`seed` 不同则纹理和亮度都不同
fn write_image(path: &Path, seed: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = RgbImage::from_fn(32, 32, |x, y| {
        let v = ((x * seed + y * (seed + 3)) % 256) as u8;
        Rgb([v, v.wrapping_add(seed as u8), (seed * 40 % 256) as u8])
    });
    img.save(path)?;
    Ok(())
}

struct Dataset {
    dir: TempDir,
}

impl Dataset {
    fn root(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    fn conf(&self) -> PathBuf {
        self.dir.path().join("conf")
    }

    fn image(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }
}

#[fixture]
fn dataset() -> Dataset {
    let dir = TempDir::new().unwrap();
    let dataset = Dataset { dir };
    write_image(&dataset.image("cat/1.png"), 3).unwrap();
    write_image(&dataset.image("cat/2.png"), 5).unwrap();
    write_image(&dataset.image("dog/1.png"), 17).unwrap();
    std::fs::write(dataset.image("dog/readme.txt"), "not an image").unwrap();
    dataset
}

#[rstest]
#[case::glcm("glcm")]
#[case::haralick("haralick")]
#[case::bit("bit")]
#[case::concat("concat")]
fn extract_then_search(dataset: Dataset, #[case] family: &str) -> Result<()> {
    cargo_run!("sigsearch", "-c", dataset.conf(), "extract", dataset.root(), "-f", family)
        .success()
        .stdout(predicate::str::contains("共 3 张"));

    cargo_run!(
        "sigsearch",
        "-c",
        dataset.conf(),
        "search",
        dataset.image("dog/1.png"),
        "-f",
        family,
        "-k",
        "2"
    )
    .success()
    .stdout(predicate::str::starts_with("0.0000\tdog\tdog/1.png"))
    .stdout(predicate::str::is_match("(?m)\\A.*\\n[^\\n]*\\n\\z")?);

    Ok(())
}

#[rstest]
fn search_json(dataset: Dataset) -> Result<()> {
    cargo_run!("sigsearch", "-c", dataset.conf(), "extract", dataset.root(), "-f", "bit").success();

    cargo_run!(
        "sigsearch",
        "-c",
        dataset.conf(),
        "search",
        dataset.image("cat/2.png"),
        "-f",
        "bit",
        "-m",
        "canberra",
        "--output-format",
        "json"
    )
    .success()
    .stdout(predicate::str::contains(r#""id": "cat/2.png""#))
    .stdout(predicate::str::contains(r#""label": "cat""#));

    Ok(())
}

#[rstest]
fn extract_keeps_other_families(dataset: Dataset) -> Result<()> {
    let signatures = dataset.conf().join("signatures");
    cargo_run!("sigsearch", "-c", dataset.conf(), "extract", dataset.root(), "-f", "bit").success();
    let npy = std::fs::read(signatures.join("bit.npy"))?;
    let json = std::fs::read(signatures.join("bit.json"))?;

    write_image(&dataset.image("dog/2.png"), 29)?;
    cargo_run!("sigsearch", "-c", dataset.conf(), "extract", dataset.root(), "-f", "glcm")
        .success()
        .stdout(predicate::str::contains("共 4 张"));

    assert_eq!(std::fs::read(signatures.join("bit.npy"))?, npy);
    assert_eq!(std::fs::read(signatures.join("bit.json"))?, json);
    cargo_run!("sigsearch", "-c", dataset.conf(), "info")
        .success()
        .stdout(predicate::str::contains("bit         16 维\t3 条记录"))
        .stdout(predicate::str::contains("glcm         6 维\t4 条记录"));
    Ok(())
}

#[rstest]
fn extract_logs_degraded_images(dataset: Dataset) -> Result<()> {
    std::fs::write(dataset.image("dog/broken.png"), b"garbage")?;
    Command::cargo_bin("sigsearch")?
        .env("RUST_LOG", "warn")
        .arg("-c")
        .arg(dataset.conf())
        .arg("extract")
        .arg(dataset.root())
        .args(["-f", "bit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("退化 1 张"))
        .stderr(predicate::str::contains("使用全 0 向量代替"));
    Ok(())
}

#[rstest]
fn search_without_store(dataset: Dataset) -> Result<()> {
    cargo_run!(
        "sigsearch",
        "-c",
        dataset.conf(),
        "search",
        dataset.image("cat/1.png"),
        "-f",
        "glcm"
    )
    .failure()
    .stderr(predicate::str::contains("尚未构建"));
    Ok(())
}

#[rstest]
fn info_reports_missing_stores(dataset: Dataset) -> Result<()> {
    cargo_run!("sigsearch", "-c", dataset.conf(), "extract", dataset.root(), "-f", "haralick")
        .success();

    cargo_run!("sigsearch", "-c", dataset.conf(), "info")
        .success()
        .stdout(predicate::str::contains("haralick    13 维\t3 条记录"))
        .stdout(predicate::str::contains("尚未构建的特征库: glcm, bit, concat"))
        .stdout(predicate::str::contains("已登记人脸: 0"));
    Ok(())
}

#[rstest]
fn enroll_and_identify(dataset: Dataset) -> Result<()> {
    let conf = dataset.conf();
    cargo_run!("sigsearch", "-c", &conf, "enroll", "alice", dataset.image("cat/1.png")).success();
    cargo_run!("sigsearch", "-c", &conf, "enroll", "bob", dataset.image("dog/1.png")).success();

    cargo_run!("sigsearch", "-c", &conf, "identify", dataset.image("dog/1.png"))
        .success()
        .stdout(predicate::str::diff("bob\t0.0000\n"));

    // 未登记的人脸
    cargo_run!("sigsearch", "-c", &conf, "identify", dataset.image("cat/2.png"), "-t", "0.001")
        .success()
        .stdout(predicate::str::contains("没有匹配的身份"));

    // 更新 alice 的人脸后，旧图片不再匹配
    cargo_run!("sigsearch", "-c", &conf, "enroll", "alice", dataset.image("cat/2.png")).success();
    cargo_run!("sigsearch", "-c", &conf, "identify", dataset.image("cat/2.png"))
        .success()
        .stdout(predicate::str::starts_with("alice\t"));

    cargo_run!("sigsearch", "-c", &conf, "enroll", "bob", "--remove").success();
    cargo_run!("sigsearch", "-c", &conf, "enroll", "bob", "--remove").failure();
    cargo_run!("sigsearch", "-c", &conf, "info")
        .success()
        .stdout(predicate::str::contains("已登记人脸: 1"));

    Ok(())
}

#[rstest]
fn identify_undecodable(dataset: Dataset) -> Result<()> {
    cargo_run!("sigsearch", "-c", dataset.conf(), "identify", dataset.image("dog/readme.txt"))
        .failure()
        .stderr(predicate::str::contains("解码图片失败"));
    Ok(())
}
