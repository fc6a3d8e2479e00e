use anyhow::{Context, Result};
use clap::Parser;
use gml_filter::{FilterOptions, LocationPath};
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 入力XML/GMLファイル、またはディレクトリ
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// 出力ディレクトリ
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// 残す要素のパス（例: /wfs:FeatureCollection/wfs:member）。複数指定可
    #[arg(short, long = "path", value_name = "PATH", required = true)]
    paths: Vec<String>,

    /// パスで使う名前空間接頭辞（PREFIX=URI）。複数指定可
    #[arg(short, long = "namespace", value_name = "PREFIX=URI", value_parser = parse_binding)]
    namespaces: Vec<(String, String)>,

    /// インデント幅（スペース数）
    #[arg(long)]
    indent: Option<usize>,

    /// テキストノード前後の空白を除去
    #[arg(long)]
    trim_text: bool,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long)]
    threads: Option<usize>,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (prefix, uri) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=URI, got '{}'", s))?;
    if prefix.is_empty() || uri.is_empty() {
        return Err(format!("expected PREFIX=URI, got '{}'", s));
    }
    Ok((prefix.to_string(), uri.to_string()))
}

/// 1回の実行で全ファイルに共通する設定
struct Job {
    paths: Vec<LocationPath>,
    options: FilterOptions,
    output: PathBuf,
}

impl Job {
    fn from_args(args: &Args) -> Result<Self> {
        let bindings: HashMap<String, String> = args.namespaces.iter().cloned().collect();
        let paths = args
            .paths
            .iter()
            .map(|expr| LocationPath::parse(expr, &bindings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            paths,
            options: FilterOptions {
                indent: args.indent,
                trim_text: args.trim_text,
            },
            output: args.output.clone(),
        })
    }
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt::init();

    // CLI引数の解析
    let args = Args::parse();
    let job = Job::from_args(&args)?;

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    // 出力ディレクトリの作成
    fs::create_dir_all(&job.output)?;

    for path in &job.paths {
        info!("Keeping elements on path {}", path);
    }

    // 入力パスの処理
    if args.input.is_file() {
        if !is_xml_file(&args.input) {
            error!("Unsupported file type: {:?}", args.input);
            anyhow::bail!("Input file must be .xml or .gml");
        }
        info!("Processing XML file: {:?}", args.input);
        let base = args.input.parent().unwrap_or_else(|| Path::new(""));
        process_file(&args.input, base, &job)?;
    } else if args.input.is_dir() {
        info!("Processing directory: {:?}", args.input);
        process_directory(&args.input, &job)?;
    } else {
        error!("Invalid input path: {:?}", args.input);
        anyhow::bail!("Input path must be a file or directory");
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn is_xml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("xml") | Some("gml")
    )
}

/// `base` 以下の相対パスを出力ディレクトリ側に再現して書き出す
fn process_file(path: &Path, base: &Path, job: &Job) -> Result<()> {
    let relative = path
        .strip_prefix(base)
        .with_context(|| format!("{:?} is not below {:?}", path, base))?;
    if relative.file_name().is_none() {
        anyhow::bail!("Input path has no file name: {:?}", path);
    }
    let output_path = job.output.join(relative);

    // サブディレクトリを作成
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let summary = gml_filter::filter_file(path, &output_path, job.paths.iter().cloned(), &job.options)
        .with_context(|| format!("Failed to filter {:?}", path))?;

    info!(
        "Written {:?} ({} of {} elements kept)",
        output_path, summary.elements_written, summary.elements_seen
    );
    Ok(())
}

fn process_directory(dir: &Path, job: &Job) -> Result<()> {
    use rayon::prelude::*;

    // XMLファイルを再帰的に収集
    let input_files = collect_input_files(dir)?;
    info!("Found {} input files (XML/GML)", input_files.len());

    // 並列処理でファイルを変換
    let results: Vec<Result<()>> = input_files
        .par_iter()
        .map(|path| process_file(path, dir, job))
        .collect();

    // エラーをチェック
    let mut errors = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            errors.push(format!("{}: {:#}", input_files[i].display(), e));
        }
    }

    if !errors.is_empty() {
        error!("Failed to process {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to process", errors.len());
    }

    Ok(())
}

fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            // サブディレクトリを再帰的に探索
            files.extend(collect_input_files(&path)?);
        } else if is_xml_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(output: &Path, exprs: &[&str]) -> Job {
        Job {
            paths: exprs.iter().map(|e| e.parse().unwrap()).collect(),
            options: FilterOptions::default(),
            output: output.to_path_buf(),
        }
    }

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("gml=http://www.opengis.net/gml/3.2").unwrap(),
            (
                "gml".to_string(),
                "http://www.opengis.net/gml/3.2".to_string()
            )
        );
        assert!(parse_binding("gml").is_err());
        assert!(parse_binding("=urn:x").is_err());
        assert!(parse_binding("gml=").is_err());
    }

    #[test]
    fn test_job_resolves_prefixes() {
        let args = Args::parse_from([
            "gml-filter",
            "in.gml",
            "-o",
            "out",
            "-n",
            "wfs=http://www.opengis.net/wfs/2.0",
            "-p",
            "/wfs:FeatureCollection/wfs:member",
            "--trim-text",
        ]);
        let job = Job::from_args(&args).unwrap();
        assert_eq!(job.paths.len(), 1);
        assert_eq!(
            job.paths[0].steps()[1].namespace(),
            Some("http://www.opengis.net/wfs/2.0")
        );
        assert!(job.options.trim_text);
    }

    #[test]
    fn test_job_rejects_unbound_prefix() {
        let args = Args::parse_from(["gml-filter", "in.gml", "-o", "out", "-p", "/gml:pos"]);
        assert!(Job::from_args(&args).is_err());
    }

    #[test]
    fn test_process_directory() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let nested = input_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(input_dir.path().join("one.xml"), "<a><b>1</b><c/></a>").unwrap();
        fs::write(nested.join("two.gml"), "<a><c/><b>2</b></a>").unwrap();
        fs::write(input_dir.path().join("notes.txt"), "ignored").unwrap();

        let job = job(output_dir.path(), &["/a/b"]);
        process_directory(input_dir.path(), &job).unwrap();

        assert_eq!(
            fs::read_to_string(output_dir.path().join("one.xml")).unwrap(),
            "<a><b>1</b></a>"
        );
        assert_eq!(
            fs::read_to_string(output_dir.path().join("nested").join("two.gml")).unwrap(),
            "<a><b>2</b></a>"
        );
        assert!(!output_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_process_directory_keeps_same_named_files_apart() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        for (sub, text) in [("x", "x"), ("y", "y")] {
            let dir = input_dir.path().join(sub);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("a.xml"), format!("<a><b>{}</b><c/></a>", text)).unwrap();
        }

        let job = job(output_dir.path(), &["/a/b"]);
        process_directory(input_dir.path(), &job).unwrap();

        assert_eq!(
            fs::read_to_string(output_dir.path().join("x").join("a.xml")).unwrap(),
            "<a><b>x</b></a>"
        );
        assert_eq!(
            fs::read_to_string(output_dir.path().join("y").join("a.xml")).unwrap(),
            "<a><b>y</b></a>"
        );
        assert!(!output_dir.path().join("a.xml").exists());
    }

    #[test]
    fn test_process_single_file() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let input = input_dir.path().join("one.gml");
        fs::write(&input, "<a><c/><b>1</b></a>").unwrap();

        let job = job(output_dir.path(), &["/a/b"]);
        process_file(&input, input_dir.path(), &job).unwrap();

        assert_eq!(
            fs::read_to_string(output_dir.path().join("one.gml")).unwrap(),
            "<a><b>1</b></a>"
        );
    }

    #[test]
    fn test_process_directory_reports_failures() {
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        fs::write(input_dir.path().join("broken.xml"), "<a><b></a>").unwrap();

        let job = job(output_dir.path(), &["/a"]);
        let err = process_directory(input_dir.path(), &job).unwrap_err();
        assert!(err.to_string().contains("1 files failed"));
    }
}
