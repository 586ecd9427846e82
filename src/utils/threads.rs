use futures::future::join_all;
use std::future::Future;
use tokio::sync::Semaphore;

/// 以最大并发数执行一组 future，结果顺序与输入顺序一致
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, max_concurrent: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let semaphore = Semaphore::new(max_concurrent.max(1));
    let semaphore = &semaphore;

    let tasks = futures.into_iter().map(|fut| async move {
        // 信号量不会被关闭，acquire 只会在拿到许可后返回
        let _permit = semaphore.acquire().await;
        fut.await
    });

    join_all(tasks).await
}
