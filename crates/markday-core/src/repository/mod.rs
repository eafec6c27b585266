//! Repositories: cached, observable views over the stores
//!
//! Each repository keeps one snapshot cell filled from two sources started at
//! construction: the store's live snapshot stream and a one-shot read of the
//! current contents. A live snapshot always wins over the one-shot read.

mod cache;
mod diary;
mod files;

pub use diary::DiaryRepository;
pub use files::FileRepository;
