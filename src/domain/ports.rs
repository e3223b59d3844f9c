use crate::domain::model::City;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait DataSource: Send + Sync {
    fn read_dataset(&self) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn describe(&self) -> String;
}

/// 請求層級的設定，供 server 與搜尋上限讀取。
pub trait ConfigProvider: Send + Sync {
    fn timeout_seconds(&self) -> u64;
    fn concurrency_limit(&self) -> usize;
    fn default_limit(&self) -> usize;
    fn max_limit(&self) -> usize;
}

/// Read side and bulk-load side of the city index.
#[async_trait]
pub trait CityStore: Send + Sync {
    async fn put_batch(&self, cities: Vec<City>) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<City>>;
    async fn get_many(&self, ids: &[u64]) -> Result<Vec<City>>;
    async fn ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<u64>>;
    async fn ids_by_name(&self, name: &str) -> Result<Vec<u64>>;
    async fn ping(&self) -> Result<()>;
    async fn city_count(&self) -> Result<usize>;
    async fn name_count(&self) -> Result<usize>;
    async fn key_count(&self) -> Result<usize>;
}
