use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::Serialize;

pub const PER_PAGE: u64 = 10;

/// Coarse type filter for the file list. Each variant maps to a curated set
/// of MIME strings rather than the full classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    Image,
    Video,
    Audio,
    Document,
    Archive,
}

impl TypeFilter {
    /// Unrecognized values yield `None`, which means no type restriction.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(TypeFilter::Image),
            "video" => Some(TypeFilter::Video),
            "audio" => Some(TypeFilter::Audio),
            "document" => Some(TypeFilter::Document),
            "archive" => Some(TypeFilter::Archive),
            _ => None,
        }
    }

    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            TypeFilter::Image => &[
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/svg+xml",
            ],
            TypeFilter::Video => &["video/mp4", "video/webm", "video/ogg"],
            TypeFilter::Audio => &["audio/mpeg", "audio/wav", "audio/ogg"],
            TypeFilter::Document => &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.ms-powerpoint",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ],
            TypeFilter::Archive => &[
                "application/zip",
                "application/x-rar-compressed",
                "application/x-7z-compressed",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// `date`: oldest first.
    DateAsc,
    /// `size`
    SizeAsc,
    /// `-size`
    SizeDesc,
    #[default]
    Newest,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("date") => SortOrder::DateAsc,
            Some("size") => SortOrder::SizeAsc,
            Some("-size") => SortOrder::SizeDesc,
            _ => SortOrder::Newest,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub file_type: Option<TypeFilter>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub search: Option<String>,
    pub sort: SortOrder,
    /// 1-based; anything below 1 is treated as the first page.
    pub page: u64,
}

/// One page of results in the offset-pagination envelope clients expect.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, current_page: u64) -> Self {
        let last_page = total.div_ceil(PER_PAGE).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = current_page
                .saturating_sub(1)
                .saturating_mul(PER_PAGE)
                .saturating_add(1);
            (Some(from), Some(from.saturating_add(data.len() as u64 - 1)))
        };

        Self {
            data,
            total,
            per_page: PER_PAGE,
            current_page,
            last_page,
            from,
            to,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}

/// Escapes the LIKE wildcards so user input only ever matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct FileListing;

impl FileListing {
    fn date_part(backend: DatabaseBackend, part: &str) -> String {
        match backend {
            DatabaseBackend::Postgres => format!(
                "CAST(EXTRACT({} FROM \"files\".\"created_at\") AS INTEGER)",
                if part == "%Y" { "YEAR" } else { "MONTH" }
            ),
            _ => format!(
                "CAST(strftime('{}', \"files\".\"created_at\") AS INTEGER)",
                part
            ),
        }
    }

    fn condition(backend: DatabaseBackend, filters: &ListFilters) -> Condition {
        let mut cond = Condition::all();

        if let Some(file_type) = filters.file_type {
            cond = cond.add(files::Column::MimeType.is_in(file_type.mime_types().iter().copied()));
        }

        if let Some(year) = filters.year {
            cond = cond.add(Expr::expr(Expr::cust(Self::date_part(backend, "%Y"))).eq(year));
        }
        if let Some(month) = filters.month {
            cond = cond.add(Expr::expr(Expr::cust(Self::date_part(backend, "%m"))).eq(month));
        }

        if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
            // Case-insensitive substring match; wildcards in the term are literal
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            cond = cond.add(
                Expr::expr(Func::lower(Expr::col(files::Column::Filename)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        cond
    }

    fn ordered(select: Select<Files>, sort: SortOrder) -> Select<Files> {
        match sort {
            SortOrder::DateAsc => select
                .order_by_asc(files::Column::CreatedAt)
                .order_by_asc(files::Column::Id),
            SortOrder::SizeAsc => select
                .order_by_asc(files::Column::Size)
                .order_by_asc(files::Column::Id),
            SortOrder::SizeDesc => select
                .order_by_desc(files::Column::Size)
                .order_by_desc(files::Column::Id),
            SortOrder::Newest => select
                .order_by_desc(files::Column::CreatedAt)
                .order_by_desc(files::Column::Id),
        }
    }

    /// Filtered, sorted page of files. An empty result is a normal page with
    /// `total == 0`.
    pub async fn list(
        db: &impl ConnectionTrait,
        filters: &ListFilters,
    ) -> Result<Page<files::Model>, AppError> {
        let backend = db.get_database_backend();
        let select = Self::ordered(
            Files::find().filter(Self::condition(backend, filters)),
            filters.sort,
        );

        let page = filters.page.max(1);
        let paginator = select.paginate(db, PER_PAGE);
        let total = paginator.num_items().await?;
        let items = match (page - 1).checked_mul(PER_PAGE) {
            Some(offset) if offset < total => paginator.fetch_page(page - 1).await?,
            _ => Vec::new(),
        };

        tracing::debug!(
            "Listed {} of {} files (page {}, sort {:?})",
            items.len(),
            total,
            page,
            filters.sort
        );
        Ok(Page::new(items, total, page))
    }
}
