mod prop_reports;
