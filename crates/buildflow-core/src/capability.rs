//! バージョンで有効化される機能のテーブル
//!
//! コマンドラインのオプション機能は全て [`Feature`] を経由して判定します。
//! 機能ごとの最低バージョンはここにしか書きません。

use crate::error::{CoreError, Result};
use semver::{Version, VersionReq};

/// バージョンを報告するコンポーネント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// buildx CLI
    Buildx,
    /// 選択中ビルダーの BuildKit デーモン
    Buildkit,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Buildx => write!(f, "Buildx"),
            Component::Buildkit => write!(f, "BuildKit"),
        }
    }
}

/// バージョン依存の機能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// マルチプラットフォームビルドでの `--iidfile`
    IidFile,
    /// `--metadata-file`
    MetadataFile,
    /// `--build-context`
    BuildContexts,
    /// `--attest`（attests / provenance / sbom）
    Attestations,
    /// 入力なしで付与する provenance attestation
    DefaultProvenance,
    /// `--annotation`
    Annotations,
    /// `buildx history`（post でのサマリ生成）
    BuildHistory,
    /// `buildx history export`（ビルドレコードの書き出し）
    HistoryExport,
    /// `--call`
    Call,
    /// `BUILDX_METADATA_WARNINGS`
    MetadataWarnings,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::IidFile,
        Feature::MetadataFile,
        Feature::BuildContexts,
        Feature::Attestations,
        Feature::DefaultProvenance,
        Feature::Annotations,
        Feature::BuildHistory,
        Feature::HistoryExport,
        Feature::Call,
        Feature::MetadataWarnings,
    ];

    pub fn component(self) -> Component {
        match self {
            Feature::DefaultProvenance => Component::Buildkit,
            _ => Component::Buildx,
        }
    }

    pub fn min_version(self) -> Version {
        match self {
            Feature::IidFile => Version::new(0, 4, 2),
            Feature::MetadataFile => Version::new(0, 6, 0),
            Feature::BuildContexts => Version::new(0, 8, 0),
            Feature::Attestations => Version::new(0, 10, 0),
            Feature::DefaultProvenance => Version::new(0, 11, 0),
            Feature::Annotations => Version::new(0, 12, 0),
            Feature::BuildHistory => Version::new(0, 13, 0),
            Feature::HistoryExport => Version::new(0, 23, 0),
            Feature::Call => Version::new(0, 15, 0),
            Feature::MetadataWarnings => Version::new(0, 15, 0),
        }
    }

    /// `>=0.12.0` 形式の範囲表現
    pub fn requirement(self) -> String {
        format!(">={}", self.min_version())
    }

    /// 警告メッセージで使う入力名
    pub fn input_names(self) -> &'static str {
        match self {
            Feature::IidFile => "platforms",
            Feature::MetadataFile => "metadata",
            Feature::BuildContexts => "build-contexts",
            Feature::Attestations => "attests, provenance and sbom",
            Feature::DefaultProvenance => "provenance",
            Feature::Annotations => "annotations",
            Feature::BuildHistory => "build summary",
            Feature::HistoryExport => "build record export",
            Feature::Call => "call",
            Feature::MetadataWarnings => "check annotations",
        }
    }
}

/// ネゴシエーション済みのバージョン情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    buildx: Version,
    buildkit: Option<Version>,
}

impl Capabilities {
    pub fn new(buildx: Version) -> Self {
        Self {
            buildx: core_version(&buildx),
            buildkit: None,
        }
    }

    pub fn with_buildkit(mut self, buildkit: Option<Version>) -> Self {
        self.buildkit = buildkit.as_ref().map(core_version);
        self
    }

    pub fn buildx_version(&self) -> &Version {
        &self.buildx
    }

    pub fn buildkit_version(&self) -> Option<&Version> {
        self.buildkit.as_ref()
    }

    /// 機能が利用可能か判定
    ///
    /// BuildKit のバージョンが不明な場合、BuildKit 依存の機能は常に非対応扱い
    pub fn satisfies(&self, feature: Feature) -> bool {
        let version = match feature.component() {
            Component::Buildx => Some(&self.buildx),
            Component::Buildkit => self.buildkit.as_ref(),
        };
        version.is_some_and(|v| *v >= feature.min_version())
    }

    /// 任意の範囲表現（例: `>=0.12.0`）を buildx のバージョンで評価
    pub fn satisfies_range(&self, range: &str) -> Result<bool> {
        let req = VersionReq::parse(range).map_err(|e| CoreError::InvalidVersionRange {
            range: range.to_string(),
            message: e.to_string(),
        })?;
        Ok(req.matches(&self.buildx))
    }
}

/// プレリリース・ビルドメタデータを除いた major.minor.patch
fn core_version(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

/// ツールが報告するバージョン文字列を寛容にパース
///
/// - `v0.12.1` → 0.12.1
/// - `0.12.1-desktop.4` → 0.12.1
/// - `0.12` → 0.12.0
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    let core = trimmed
        .split(|c: char| c == '-' || c == '+')
        .next()
        .unwrap_or_default();

    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    Some(Version::new(major, minor, patch))
}
