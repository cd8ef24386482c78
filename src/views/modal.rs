/// Which dialog is open over a table, carrying the entity it acts on.
/// A delete or edit dialog cannot exist without a selected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<T> {
    Closed,
    Viewing(T),
    Editing(T),
    Deleting(T),
    Adding,
}

impl<T> Default for ModalState<T> {
    fn default() -> Self {
        ModalState::Closed
    }
}

impl<T> ModalState<T> {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn selected(&self) -> Option<&T> {
        match self {
            ModalState::Viewing(entity) | ModalState::Editing(entity) | ModalState::Deleting(entity) => {
                Some(entity)
            }
            ModalState::Closed | ModalState::Adding => None,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            ModalState::Closed => "closed",
            ModalState::Viewing(_) => "view",
            ModalState::Editing(_) => "edit",
            ModalState::Deleting(_) => "delete",
            ModalState::Adding => "add",
        }
    }

    pub fn view(&mut self, entity: T) {
        *self = ModalState::Viewing(entity);
    }

    pub fn edit(&mut self, entity: T) {
        *self = ModalState::Editing(entity);
    }

    pub fn delete(&mut self, entity: T) {
        *self = ModalState::Deleting(entity);
    }

    pub fn add(&mut self) {
        *self = ModalState::Adding;
    }

    /// Close and hand back whatever the dialog held
    pub fn close(&mut self) -> ModalState<T> {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_modes() {
        let mut modal: ModalState<&str> = ModalState::default();
        assert!(!modal.is_open());
        assert_eq!(modal.selected(), None);

        modal.delete("sup-1");
        assert_eq!(modal.mode(), "delete");
        assert_eq!(modal.selected(), Some(&"sup-1"));

        modal.add();
        assert!(modal.is_open());
        assert_eq!(modal.selected(), None);

        modal.edit("sup-2");
        assert_eq!(modal.close(), ModalState::Editing("sup-2"));
        assert_eq!(modal, ModalState::Closed);
    }
}
