//! Query form fields and snapshot assembly.

use inview_types::{QueryMode, QuerySnapshot, Variable};

/// Selection state contributed by the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub connection_id: Option<i64>,
    pub connection_text: String,
    pub variables: Vec<Variable>,
}

/// Editable fields that are not catalog selections.
///
/// `page_size` is never zero and changing it resets `page_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryForm {
    pub mode: QueryMode,
    pub prefix: String,
    pub tag_list: String,
    page_index: u32,
    page_size: u32,
}

impl Default for QueryForm {
    fn default() -> Self {
        Self::with_page_size(QuerySnapshot::default().page_size)
    }
}

impl QueryForm {
    /// A zero `page_size` falls back to the snapshot default.
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            mode: QueryMode::default(),
            prefix: String::new(),
            tag_list: String::new(),
            page_index: 0,
            page_size: if page_size == 0 { QuerySnapshot::default().page_size } else { page_size },
        }
    }

    pub fn from_snapshot(snapshot: &QuerySnapshot) -> Self {
        let mut form = Self::with_page_size(snapshot.page_size);
        form.mode = snapshot.mode;
        form.prefix = snapshot.prefix.clone();
        form.tag_list = snapshot.tag_list.clone();
        form.page_index = snapshot.page_index;
        form
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns `false` (and leaves the form untouched) for zero.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if page_size == 0 {
            return false;
        }
        self.page_size = page_size;
        self.page_index = 0;
        true
    }

    /// Negative input clamps to the first page.
    pub fn set_page_index(&mut self, page_index: i64) {
        self.page_index = page_index.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn next_page(&mut self) {
        self.page_index = self.page_index.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }
}

/// Combine the selection and form fields into one snapshot. Pure and total.
pub fn assemble(selection: &Selection, form: &QueryForm) -> QuerySnapshot {
    QuerySnapshot {
        connection_id: selection.connection_id,
        connection_text: selection.connection_text.clone(),
        variable_ids: selection.variables.iter().map(|variable| variable.id).collect(),
        variable_names: selection.variables.iter().map(|variable| variable.name.clone()).collect(),
        mode: form.mode,
        prefix: form.prefix.clone(),
        tag_list: form.tag_list.clone(),
        page_index: form.page_index,
        page_size: form.page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_change_resets_index() {
        let mut form = QueryForm::default();
        form.set_page_index(4);
        assert!(form.set_page_size(25));
        assert_eq!(form.page_index(), 0);
        assert_eq!(form.page_size(), 25);

        form.next_page();
        assert!(form.set_page_size(25));
        assert_eq!(form.page_index(), 0, "even an unchanged size resets the index");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut form = QueryForm::default();
        form.next_page();
        assert!(!form.set_page_size(0));
        assert_eq!(form.page_size(), 10);
        assert_eq!(form.page_index(), 1);
    }

    #[test]
    fn page_index_clamps_at_zero() {
        let mut form = QueryForm::default();
        form.previous_page();
        assert_eq!(form.page_index(), 0);
        form.set_page_index(-3);
        assert_eq!(form.page_index(), 0);
    }

    #[test]
    fn assemble_copies_every_field() {
        let selection = Selection {
            connection_id: Some(7),
            connection_text: "PLC-7".into(),
            variables: vec![Variable::new(1, "Pressure"), Variable::new(2, "Flow")],
        };
        let mut form = QueryForm::default();
        form.mode = QueryMode::Event;
        form.prefix = "line1/".into();
        form.tag_list = "t1,t2".into();
        form.next_page();

        let snapshot = assemble(&selection, &form);
        assert_eq!(snapshot.variable_ids, vec![1, 2]);
        assert_eq!(snapshot.variable_names, vec!["Pressure", "Flow"]);
        assert_eq!(snapshot.query_text(), "1,2");
        assert_eq!(snapshot.mode, QueryMode::Event);
        assert_eq!(snapshot.page_index, 1);
        assert_eq!(QueryForm::from_snapshot(&snapshot), form);
    }
}
