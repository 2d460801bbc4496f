//! # 月面热图查看器 — 演示入口
//!
//! 本文件仅负责参数解析与流程串联，业务逻辑全部在库中，
//! 详见 `lib.rs` 架构文档。
//!
//! 执行一个完整的视图周期：加载底图 → 应用筛选条件与比值选择 →
//! 把合成表面编码为 PNG 落盘。

use std::path::PathBuf;

use clap::Parser;

use lunar_heatmap::error::AppError;
use lunar_heatmap::map_view::MapView;
use lunar_heatmap::overlay::{
    AssetBase, ElementalRatio, FilterSelection, Month, ViewerConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "lunar-heatmap",
    about = "月面元素浓度热图叠加合成演示",
    version
)]
struct Cli {
    /// 资源目录（包含 lunarMap.png 与各叠加图）
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// 年份，如 2022
    #[arg(long)]
    year: Option<i32>,

    /// 月份三字母代号（jan ~ dec）
    #[arg(long)]
    month: Option<Month>,

    /// 元素比值（Mg:Si / Al:Si / Ca:Si / Na:Si）
    #[arg(long)]
    ratio: Option<ElementalRatio>,

    /// 使用叠加（overlapped）版本的热图
    #[arg(long)]
    overlapped: bool,

    /// 合成结果的输出路径
    #[arg(long, default_value = "composite.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("❌ 合成失败: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = ViewerConfig {
        asset_base: AssetBase::Dir(cli.assets),
        ..ViewerConfig::default()
    };

    let mut view = MapView::new(config)?;
    view.load_base_map().await?;

    let selection = FilterSelection {
        year: cli.year,
        month: cli.month,
        elemental_ratio: cli.ratio,
        is_overlapping: cli.overlapped,
    };

    let state = view.apply_filter(selection).await?;
    log::info!("筛选叠加层状态: {:?}", state);

    if cli.ratio.is_some() {
        let state = view.select_ratio(cli.ratio).await?;
        log::info!("比值叠加层状态: {:?}", state);
    }

    let png = view.surface()?.encode_png()?;
    std::fs::write(&cli.output, png)?;
    log::info!("✅ 合成结果已写入 {}", cli.output.display());

    Ok(())
}
