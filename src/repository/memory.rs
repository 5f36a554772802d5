//! In-process catalog store.
//!
//! All four tables sit behind one `RwLock`, so a delete checks dependents and
//! removes under the same write guard.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CatalogStore, Removal};
use crate::{
    error::AppResult,
    models::{
        Author, Book, BookInstance, BookInstanceStatus, Genre, NewAuthor, NewBook,
        NewBookInstance, NewGenre,
    },
};

#[derive(Debug, Default)]
struct Tables {
    authors: IndexMap<Uuid, Author>,
    genres: IndexMap<Uuid, Genre>,
    books: IndexMap<Uuid, Book>,
    book_instances: IndexMap<Uuid, BookInstance>,
}

/// Catalog store kept in memory, preserving insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_guarded<T>(
    table: &mut IndexMap<Uuid, T>,
    id: Uuid,
    referenced: impl FnOnce() -> bool,
) -> Removal {
    if !table.contains_key(&id) {
        return Removal::Missing;
    }
    if referenced() {
        return Removal::Referenced;
    }
    table.shift_remove(&id);
    Removal::Removed
}

fn replace<T>(table: &mut IndexMap<Uuid, T>, id: Uuid, value: T) -> bool {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut authors: Vec<Author> = tables.authors.values().cloned().collect();
        authors.sort_by(|a, b| {
            a.family_name
                .cmp(&b.family_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(authors)
    }

    async fn get_author(&self, id: Uuid) -> AppResult<Option<Author>> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn create_author(&self, author: &NewAuthor) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tables = self.tables.write().await;
        tables.authors.insert(id, author.clone().with_id(id));
        Ok(id)
    }

    async fn update_author(&self, id: Uuid, author: &NewAuthor) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(&mut tables.authors, id, author.clone().with_id(id)))
    }

    async fn delete_author(&self, id: Uuid) -> AppResult<Removal> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let books = &tables.books;
        Ok(remove_guarded(&mut tables.authors, id, || {
            books.values().any(|b| b.author == id)
        }))
    }

    async fn count_authors(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = tables.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn get_genre(&self, id: Uuid) -> AppResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables.genres.values().find(|g| g.name == name).cloned())
    }

    async fn create_genre(&self, genre: &NewGenre) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tables = self.tables.write().await;
        tables.genres.insert(id, genre.clone().with_id(id));
        Ok(id)
    }

    async fn update_genre(&self, id: Uuid, genre: &NewGenre) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(&mut tables.genres, id, genre.clone().with_id(id)))
    }

    async fn delete_genre(&self, id: Uuid) -> AppResult<Removal> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let books = &tables.books;
        Ok(remove_guarded(&mut tables.genres, id, || {
            books.values().any(|b| b.has_genre(id))
        }))
    }

    async fn count_genres(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.genres.len() as i64)
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.tables.read().await.books.values().cloned().collect())
    }

    async fn get_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn list_books_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| b.author == author_id)
            .cloned()
            .collect())
    }

    async fn list_books_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| b.has_genre(genre_id))
            .cloned()
            .collect())
    }

    async fn create_book(&self, book: &NewBook) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tables = self.tables.write().await;
        tables.books.insert(id, book.clone().with_id(id));
        Ok(id)
    }

    async fn update_book(&self, id: Uuid, book: &NewBook) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(&mut tables.books, id, book.clone().with_id(id)))
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<Removal> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let instances = &tables.book_instances;
        Ok(remove_guarded(&mut tables.books, id, || {
            instances.values().any(|i| i.book == id)
        }))
    }

    async fn count_books(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }

    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>> {
        Ok(self
            .tables
            .read()
            .await
            .book_instances
            .values()
            .cloned()
            .collect())
    }

    async fn get_book_instance(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        Ok(self.tables.read().await.book_instances.get(&id).cloned())
    }

    async fn list_book_instances_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .book_instances
            .values()
            .filter(|i| i.book == book_id)
            .cloned()
            .collect())
    }

    async fn create_book_instance(&self, instance: &NewBookInstance) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tables = self.tables.write().await;
        tables
            .book_instances
            .insert(id, instance.clone().with_id(id));
        Ok(id)
    }

    async fn update_book_instance(&self, id: Uuid, instance: &NewBookInstance) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(
            &mut tables.book_instances,
            id,
            instance.clone().with_id(id),
        ))
    }

    async fn delete_book_instance(&self, id: Uuid) -> AppResult<Removal> {
        let mut tables = self.tables.write().await;
        Ok(remove_guarded(&mut tables.book_instances, id, || false))
    }

    async fn count_book_instances(&self, status: Option<BookInstanceStatus>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        let count = match status {
            Some(status) => tables
                .book_instances
                .values()
                .filter(|i| i.status == status)
                .count(),
            None => tables.book_instances.len(),
        };
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(family_name: &str, first_name: &str) -> NewAuthor {
        NewAuthor {
            first_name: first_name.to_string(),
            family_name: family_name.to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    fn book(author: Uuid, genre: Vec<Uuid>) -> NewBook {
        NewBook {
            title: "Title".to_string(),
            author,
            summary: "Summary".to_string(),
            isbn: "isbn".to_string(),
            genre,
        }
    }

    #[tokio::test]
    async fn test_authors_sorted_by_family_then_first_name() {
        let store = MemoryStore::new();
        store.create_author(&author("Tolkien", "John")).await.unwrap();
        store.create_author(&author("Austen", "Jane")).await.unwrap();
        store.create_author(&author("Austen", "Cassandra")).await.unwrap();

        let names: Vec<String> = store
            .list_authors()
            .await
            .unwrap()
            .iter()
            .map(Author::name)
            .collect();
        assert_eq!(names, vec!["Austen, Cassandra", "Austen, Jane", "Tolkien, John"]);
    }

    #[tokio::test]
    async fn test_update_preserves_position_and_id() {
        let store = MemoryStore::new();
        let first = store.create_author(&author("A", "One")).await.unwrap();
        let second = store.create_author(&author("B", "Two")).await.unwrap();

        assert!(store.update_author(first, &author("C", "Three")).await.unwrap());
        assert!(!store.update_author(Uuid::new_v4(), &author("D", "Four")).await.unwrap());

        let updated = store.get_author(first).await.unwrap().unwrap();
        assert_eq!(updated.id, first);
        assert_eq!(updated.family_name, "C");
        assert!(store.get_author(second).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_guarded_deletes() {
        let store = MemoryStore::new();
        let author_id = store.create_author(&author("Tolkien", "John")).await.unwrap();
        let genre_id = store
            .create_genre(&NewGenre {
                name: "Fantasy".to_string(),
            })
            .await
            .unwrap();
        let book_id = store
            .create_book(&book(author_id, vec![genre_id]))
            .await
            .unwrap();

        assert_eq!(store.delete_author(author_id).await.unwrap(), Removal::Referenced);
        assert_eq!(store.delete_genre(genre_id).await.unwrap(), Removal::Referenced);

        assert_eq!(store.delete_book(book_id).await.unwrap(), Removal::Removed);
        assert_eq!(store.delete_book(book_id).await.unwrap(), Removal::Missing);
        assert_eq!(store.delete_author(author_id).await.unwrap(), Removal::Removed);
        assert_eq!(store.delete_genre(genre_id).await.unwrap(), Removal::Removed);
        assert_eq!(store.count_authors().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let store = MemoryStore::new();
        let author_id = store.create_author(&author("Tolkien", "John")).await.unwrap();
        let book_id = store.create_book(&book(author_id, vec![])).await.unwrap();
        for status in [
            BookInstanceStatus::Available,
            BookInstanceStatus::Loaned,
            BookInstanceStatus::Available,
        ] {
            store
                .create_book_instance(&NewBookInstance {
                    book: book_id,
                    imprint: "Imprint".to_string(),
                    status,
                    due_back: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.count_book_instances(None).await.unwrap(), 3);
        assert_eq!(
            store
                .count_book_instances(Some(BookInstanceStatus::Available))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_book_instances(Some(BookInstanceStatus::Reserved))
                .await
                .unwrap(),
            0
        );
    }
}
